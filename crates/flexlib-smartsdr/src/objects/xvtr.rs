//! Transverter definitions.

use flexlib_core::ObjectKind;

use crate::codec::Hz;
use crate::object::RadioObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Xvtr {
    pub id: u32,
    pub initialized: bool,

    pub in_use: bool,
    pub name: String,
    pub order: u32,
    pub rf_frequency: Hz,
    pub if_frequency: Hz,
    pub lo_error: Hz,
    pub rx_gain: f64,
    pub max_power: f64,
    pub rx_only: bool,
    pub is_valid: bool,
    pub preferred: bool,
    pub two_meter_int: u32,
}

crate::property_table!(Xvtr {
    "in_use" => in_use,
    "name" => name,
    "order" => order,
    "rf_freq" => rf_frequency,
    "if_freq" => if_frequency,
    "lo_error" => lo_error,
    "rx_gain" => rx_gain,
    "max_power" => max_power,
    "rx_only" => rx_only,
    "is_valid" => is_valid,
    "preferred" => preferred,
    "two_meter_int" => two_meter_int,
});

crate::lifecycle!(Xvtr, |x| !x.name.is_empty());

impl RadioObject for Xvtr {
    type Id = u32;
    const KIND: ObjectKind = ObjectKind::Xvtr;
    const REMOVAL: Option<&'static str> = Some("in_use=0");

    fn with_id(id: u32) -> Self {
        Xvtr {
            id,
            ..Xvtr::default()
        }
    }

    fn id(&self) -> &u32 {
        &self.id
    }
}
