//! Stored memory channels.

use flexlib_core::ObjectKind;

use crate::codec::Hz;
use crate::object::RadioObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Memory {
    pub id: u32,
    pub initialized: bool,

    pub owner: String,
    pub group: String,
    pub name: String,
    pub frequency: Hz,
    pub mode: String,
    pub step: u32,
    pub repeater: String,
    pub repeater_offset: f64,
    pub tone_mode: String,
    pub tone_value: String,
    pub power: u32,
    pub rx_filter_low: i32,
    pub rx_filter_high: i32,
    pub squelch: bool,
    pub squelch_level: i32,
    pub rtty_mark: i32,
    pub rtty_shift: i32,
    pub digl_offset: i32,
    pub digu_offset: i32,
    pub highlight: bool,
    pub highlight_color: String,
}

crate::property_table!(Memory {
    "owner" => owner,
    "group" => group,
    "name" => name,
    "freq" => frequency,
    "mode" => mode,
    "step" => step,
    "repeater" => repeater,
    "repeater_offset" => repeater_offset,
    "tone_mode" => tone_mode,
    "tone_value" => tone_value,
    "power" => power,
    "rx_filter_low" => rx_filter_low,
    "rx_filter_high" => rx_filter_high,
    "squelch" => squelch,
    "squelch_level" => squelch_level,
    "rtty_mark" => rtty_mark,
    "rtty_shift" => rtty_shift,
    "digl_offset" => digl_offset,
    "digu_offset" => digu_offset,
    "highlight" => highlight,
    "highlight_color" => highlight_color,
});

// Usable as soon as the radio has described it once.
crate::lifecycle!(Memory, |_m| true);

impl RadioObject for Memory {
    type Id = u32;
    const KIND: ObjectKind = ObjectKind::Memory;

    fn with_id(id: u32) -> Self {
        Memory {
            id,
            ..Memory::default()
        }
    }

    fn id(&self) -> &u32 {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tokenize;
    use crate::collection::ObjectCollection;

    #[test]
    fn memory_initializes_on_first_status() {
        let mut mems = ObjectCollection::<Memory>::new();
        let c = mems.parse_status(
            &tokenize("4 owner=K1ABC group=Contest name=Run\u{7f}Freq freq=7.025000 mode=CW", ' '),
            true,
        );
        assert!(c[0].added && c[0].initialized);
        let m = mems.get(&4).unwrap();
        assert_eq!(m.name, "Run Freq");
        assert_eq!(m.frequency, Hz(7_025_000));
    }
}
