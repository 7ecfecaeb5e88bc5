//! Transmitter state: `transmit`, `interlock` and `atu`.
//!
//! `transmit band ...` and `interlock band ...` lines are per-band settings
//! and are routed to [`BandSetting`](super::BandSetting) instead.

use flexlib_core::ObjectKind;

use crate::codec::Hz;
use crate::object::SingleObject;

// ---------------------------------------------------------------------------
// Transmit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transmit {
    pub initialized: bool,

    pub frequency: Hz,
    pub rf_power: i32,
    pub tune_power: i32,
    pub tune: bool,
    pub mox: bool,
    pub max_power_level: i32,
    pub inhibit: bool,
    pub hwalc_enabled: bool,
    pub tx_filter_low: i32,
    pub tx_filter_high: i32,
    pub tx_filter_changes_allowed: bool,
    pub tx_rf_power_changes_allowed: bool,
    pub am_carrier_level: i32,

    pub mic_selection: String,
    pub mic_level: i32,
    pub mic_boost: bool,
    pub mic_bias: bool,
    pub mic_acc: bool,
    pub dax: bool,
    pub compander: bool,
    pub compander_level: i32,
    pub speech_processor_enable: bool,
    pub speech_processor_level: i32,
    pub vox_enable: bool,
    pub vox_level: i32,
    pub vox_delay: i32,

    pub monitor: bool,
    pub mon_gain_sb: i32,
    pub mon_pan_sb: i32,
    pub mon_gain_cw: i32,
    pub mon_pan_cw: i32,
    pub met_in_rx: bool,

    pub cw_speed: i32,
    pub cw_pitch: i32,
    pub cw_break_in: bool,
    pub cw_break_in_delay: i32,
    pub cw_iambic: bool,
    pub cw_iambic_mode: i32,
    pub cw_swap_paddles: bool,
    pub cw_sidetone: bool,
    pub cwl_enabled: bool,
    pub sync_cwx: bool,
    pub show_tx_in_waterfall: bool,
}

crate::property_table!(Transmit {
    "freq" => frequency,
    "rfpower" => rf_power,
    "tunepower" => tune_power,
    "tune" => tune,
    "mox" => mox,
    "max_power_level" => max_power_level,
    "inhibit" => inhibit,
    "hwalc_enabled" => hwalc_enabled,
    "lo" => tx_filter_low,
    "hi" => tx_filter_high,
    "tx_filter_changes_allowed" => tx_filter_changes_allowed,
    "tx_rf_power_changes_allowed" => tx_rf_power_changes_allowed,
    "am_carrier_level" => am_carrier_level,
    "mic_selection" => mic_selection,
    "mic_level" => mic_level,
    "mic_boost" => mic_boost,
    "mic_bias" => mic_bias,
    "mic_acc" => mic_acc,
    "dax" => dax,
    "compander" => compander,
    "compander_level" => compander_level,
    "speech_processor_enable" => speech_processor_enable,
    "speech_processor_level" => speech_processor_level,
    "vox_enable" => vox_enable,
    "vox_level" => vox_level,
    "vox_delay" => vox_delay,
    "sb_monitor" => monitor,
    "mon_gain_sb" => mon_gain_sb,
    "mon_pan_sb" => mon_pan_sb,
    "mon_gain_cw" => mon_gain_cw,
    "mon_pan_cw" => mon_pan_cw,
    "met_in_rx" => met_in_rx,
    "speed" => cw_speed,
    "pitch" => cw_pitch,
    "break_in" => cw_break_in,
    "break_in_delay" => cw_break_in_delay,
    "iambic" => cw_iambic,
    "iambic_mode" => cw_iambic_mode,
    "swap_paddles" => cw_swap_paddles,
    "sidetone" => cw_sidetone,
    "cwl_enabled" => cwl_enabled,
    "synccwx" => sync_cwx,
    "show_tx_in_waterfall" => show_tx_in_waterfall,
});

crate::lifecycle!(Transmit, |t| !t.frequency.is_zero());

impl SingleObject for Transmit {
    const KIND: ObjectKind = ObjectKind::Transmit;
}

// ---------------------------------------------------------------------------
// Interlock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interlock {
    pub initialized: bool,

    /// `RECEIVE`, `READY`, `NOT_READY`, `PTT_REQUESTED`, `TRANSMITTING`, ...
    pub state: String,
    pub reason: String,
    pub source: String,
    pub tx_allowed: bool,
    pub timeout: u32,
    pub amplifier: String,
    pub acc_txreq_enabled: bool,
    pub rca_txreq_enabled: bool,
    pub acc_txreq_polarity: bool,
    pub rca_txreq_polarity: bool,
    pub acc_tx_enabled: bool,
    pub tx1_enabled: bool,
    pub tx2_enabled: bool,
    pub tx3_enabled: bool,
    pub tx_delay: u32,
    pub acc_tx_delay: u32,
    pub tx1_delay: u32,
    pub tx2_delay: u32,
    pub tx3_delay: u32,
}

crate::property_table!(Interlock {
    "state" => state,
    "reason" => reason,
    "source" => source,
    "tx_allowed" => tx_allowed,
    "timeout" => timeout,
    "amplifier" => amplifier,
    "acc_txreq_enable" => acc_txreq_enabled,
    "rca_txreq_enable" => rca_txreq_enabled,
    "acc_txreq_polarity" => acc_txreq_polarity,
    "rca_txreq_polarity" => rca_txreq_polarity,
    "acc_tx_enabled" => acc_tx_enabled,
    "tx1_enabled" => tx1_enabled,
    "tx2_enabled" => tx2_enabled,
    "tx3_enabled" => tx3_enabled,
    "tx_delay" => tx_delay,
    "acc_tx_delay" => acc_tx_delay,
    "tx1_delay" => tx1_delay,
    "tx2_delay" => tx2_delay,
    "tx3_delay" => tx3_delay,
});

crate::lifecycle!(Interlock, |i| !i.state.is_empty());

impl SingleObject for Interlock {
    const KIND: ObjectKind = ObjectKind::Interlock;
}

// ---------------------------------------------------------------------------
// Atu
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atu {
    pub initialized: bool,

    /// Tune result (`NONE`, `TUNE_IN_PROGRESS`, `TUNE_SUCCESSFUL`, ...).
    pub status: String,
    pub enabled: bool,
    pub memories_enabled: bool,
    pub using_memory: bool,
}

crate::property_table!(Atu {
    "status" => status,
    "atu_enabled" => enabled,
    "memories_enabled" => memories_enabled,
    "using_mem" => using_memory,
});

crate::lifecycle!(Atu, |a| !a.status.is_empty());

impl SingleObject for Atu {
    const KIND: ObjectKind = ObjectKind::Atu;
}
