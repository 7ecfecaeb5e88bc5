//! The radio itself.
//!
//! Populated from three places: `radio ...` status lines, the `info` and
//! `version` command replies, and the list replies (`slice list`,
//! `ant list`, `mic list`, `radio uptime`). Sub-object status lines such
//! as `radio oscillator state=gpsdo` reach the table with their leading
//! words folded into the token (`oscillator_state`).

use std::collections::BTreeMap;

use flexlib_core::ObjectKind;

use crate::codec::{Hz, WireValue};
use crate::object::SingleObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Radio {
    pub initialized: bool,

    // Identity, mostly from the `info` reply.
    pub model: String,
    pub serial: String,
    pub nickname: String,
    pub callsign: String,
    pub software_version: String,
    pub region: String,
    pub options: String,
    pub screensaver: String,
    pub ip: String,
    pub netmask: String,
    pub gateway: String,
    pub num_scu: u32,
    pub num_slices: u32,
    pub num_tx: u32,
    pub atu_present: bool,
    pub gps_present: bool,

    // Status.
    pub available_slices: u32,
    pub available_panadapters: u32,
    pub lineout_gain: i32,
    pub lineout_mute: bool,
    pub headphone_gain: i32,
    pub headphone_mute: bool,
    pub remote_on_enabled: bool,
    pub full_duplex_enabled: bool,
    pub tnf_enabled: bool,
    pub binaural_rx: bool,
    pub snap_tune_enabled: bool,
    pub band_persistence_enabled: bool,
    pub mute_local_audio_when_remote: bool,
    pub enforce_private_ip_connections: bool,
    pub cal_freq: Hz,
    pub freq_error_ppb: i32,
    pub rtty_mark_default: i32,
    pub backlight: i32,
    pub daxiq_capacity: u32,
    pub daxiq_available: u32,
    pub front_speaker_mute: bool,

    pub oscillator_state: String,
    pub oscillator_setting: String,
    pub oscillator_locked: bool,
    pub oscillator_ext_present: bool,
    pub oscillator_gpsdo_present: bool,
    pub oscillator_tcxo_present: bool,

    pub static_ip: String,
    pub static_gateway: String,
    pub static_netmask: String,

    pub filter_voice_level: u32,
    pub filter_voice_auto: bool,
    pub filter_cw_level: u32,
    pub filter_cw_auto: bool,
    pub filter_digital_level: u32,
    pub filter_digital_auto: bool,

    // Reply-only data.
    /// Firmware component versions from the `version` reply.
    pub versions: BTreeMap<String, String>,
    pub slice_list: Vec<u16>,
    pub antenna_list: Vec<String>,
    pub mic_list: Vec<String>,
    /// Seconds since the radio booted.
    pub uptime: u64,
}

crate::property_table!(Radio {
    "model" => model,
    "chassis_serial" => serial,
    "nickname" => nickname,
    "callsign" => callsign,
    "software_ver" => software_version,
    "region" => region,
    "options" => options,
    "screensaver" => screensaver,
    "ip" => ip,
    "netmask" => netmask,
    "gateway" => gateway,
    "num_scu" => num_scu,
    "num_slice" => num_slices,
    "num_tx" => num_tx,
    "atu_present" => atu_present,
    "gps" => gps_present,
    "slices" => available_slices,
    "panadapters" => available_panadapters,
    "lineout_gain" => lineout_gain,
    "lineout_mute" => lineout_mute,
    "headphone_gain" => headphone_gain,
    "headphone_mute" => headphone_mute,
    "remote_on_enabled" => remote_on_enabled,
    "full_duplex_enabled" => full_duplex_enabled,
    "tnf_enabled" => tnf_enabled,
    "binaural_rx" => binaural_rx,
    "snap_tune_enabled" => snap_tune_enabled,
    "band_persistence_enabled" => band_persistence_enabled,
    "mute_local_audio_when_remote" => mute_local_audio_when_remote,
    "enforce_private_ip_connections" => enforce_private_ip_connections,
    "cal_freq" => cal_freq,
    "freq_error_ppb" => freq_error_ppb,
    "rtty_mark_default" => rtty_mark_default,
    "backlight" => backlight,
    "daxiq_capacity" => daxiq_capacity,
    "daxiq_available" => daxiq_available,
    "front_speaker_mute" => front_speaker_mute,
    "oscillator_state" => oscillator_state,
    "oscillator_setting" => oscillator_setting,
    "oscillator_locked" => oscillator_locked,
    "oscillator_ext_present" => oscillator_ext_present,
    "oscillator_gpsdo_present" => oscillator_gpsdo_present,
    "oscillator_tcxo_present" => oscillator_tcxo_present,
    "static_net_params_ip" => static_ip,
    "static_net_params_gateway" => static_gateway,
    "static_net_params_netmask" => static_netmask,
    "filter_sharpness_voice_level" => filter_voice_level,
    "filter_sharpness_voice_auto_level" => filter_voice_auto,
    "filter_sharpness_cw_level" => filter_cw_level,
    "filter_sharpness_cw_auto_level" => filter_cw_auto,
    "filter_sharpness_digital_level" => filter_digital_level,
    "filter_sharpness_digital_auto_level" => filter_digital_auto,
} fallback = info_alias);

crate::lifecycle!(Radio, |r| !r.model.is_empty());

impl Radio {
    /// `info` spells the nickname `name`.
    fn info_alias(&mut self, token: &str, value: &str) -> bool {
        match token {
            "name" => self.nickname = String::decode_wire(value),
            _ => return false,
        }
        true
    }
}

impl SingleObject for Radio {
    const KIND: ObjectKind = ObjectKind::Radio;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
