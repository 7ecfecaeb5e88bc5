//! Meters.
//!
//! Meter definitions arrive on the control connection in the dotted,
//! `#`-separated form (`meter 5.src=SLC#5.num=0#5.nam=LEVEL#...`). Their
//! live readings arrive separately in VITA-49 meter packets as raw `i16`
//! values, scaled here according to the meter's unit.

use flexlib_core::ObjectKind;

use crate::object::{IdRule, RadioObject};

/// Source name of meters that belong to a slice.
pub const SOURCE_SLICE: &str = "SLC";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meter {
    pub id: u16,
    pub initialized: bool,

    /// Source subsystem (`SLC`, `TX-`, `RAD`, `AMP`, `COD-`, ...).
    pub source: String,
    /// Index within the source, e.g. the slice number for `SLC`.
    pub source_index: u32,
    pub name: String,
    pub description: String,
    pub units: String,
    pub low: f64,
    pub high: f64,
    pub fps: u32,

    /// Last reading, scaled to `units`.
    pub value: f32,
}

crate::property_table!(Meter {
    "src" => source,
    "num" => source_index,
    "nam" => name,
    "desc" => description,
    "unit" => units,
    "low" => low,
    "hi" => high,
    "fps" => fps,
});

crate::lifecycle!(Meter, |m| !m.name.is_empty());

impl Meter {
    /// Whether this meter is sourced from slice `slice`.
    pub fn belongs_to_slice(&self, slice: u16) -> bool {
        self.source == SOURCE_SLICE && self.source_index == u32::from(slice)
    }

    /// Store a raw reading from a meter packet.
    pub fn set_raw_value(&mut self, raw: i16) {
        self.value = scale_meter_value(&self.units, raw);
    }
}

/// Convert a raw meter reading to the meter's unit.
///
/// Decibel and SWR values are fixed-point with 7 fractional bits, volts and
/// amps with 8, temperatures with 6. Other units are reported unscaled.
pub fn scale_meter_value(units: &str, raw: i16) -> f32 {
    let raw = f32::from(raw);
    match units {
        "dB" | "dBm" | "dBFS" | "SWR" => raw / 128.0,
        "Volts" | "Amps" => raw / 256.0,
        "degC" | "degF" => raw / 64.0,
        _ => raw,
    }
}

impl RadioObject for Meter {
    type Id = u16;
    const KIND: ObjectKind = ObjectKind::Meter;
    const ID_RULE: IdRule = IdRule::Dotted;

    fn with_id(id: u16) -> Self {
        Meter {
            id,
            ..Meter::default()
        }
    }

    fn id(&self) -> &u16 {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
