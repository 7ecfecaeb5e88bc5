//! Per-band transmit and interlock settings.
//!
//! These arrive under two parents, `interlock band <n> ...` and
//! `transmit band <n> ...`, and merge into one object per band number.

use flexlib_core::ObjectKind;

use crate::object::{IdRule, RadioObject};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandSetting {
    pub id: u16,
    pub initialized: bool,

    pub band_name: String,
    pub rf_power: i32,
    pub tune_power: i32,
    pub hwalc_enabled: bool,
    pub inhibit: bool,
    pub acc_txreq_enabled: bool,
    pub rca_txreq_enabled: bool,
    pub acc_tx_enabled: bool,
    pub tx1_enabled: bool,
    pub tx2_enabled: bool,
    pub tx3_enabled: bool,
}

crate::property_table!(BandSetting {
    "band_name" => band_name,
    "rfpower" => rf_power,
    "tunepower" => tune_power,
    "hwalc_enabled" => hwalc_enabled,
    "inhibit" => inhibit,
    "acc_txreq_enable" => acc_txreq_enabled,
    "rca_txreq_enable" => rca_txreq_enabled,
    "acc_tx_enabled" => acc_tx_enabled,
    "tx1_enabled" => tx1_enabled,
    "tx2_enabled" => tx2_enabled,
    "tx3_enabled" => tx3_enabled,
});

crate::lifecycle!(BandSetting, |b| !b.band_name.is_empty());

impl RadioObject for BandSetting {
    type Id = u16;
    const KIND: ObjectKind = ObjectKind::BandSetting;
    const ID_RULE: IdRule = IdRule::Second;

    fn with_id(id: u16) -> Self {
        BandSetting {
            id,
            ..BandSetting::default()
        }
    }

    fn id(&self) -> &u16 {
        &self.id
    }
}
