//! Receiver slices.
//!
//! A slice is one independent receiver tuned somewhere inside a
//! panadapter. The radio reports a slice with `in_use=1` while it exists and
//! a final `in_use=0` line when it is closed.

use flexlib_core::{ClientHandle, ObjectKind, StreamId};

use crate::codec::{CommaList, Hz};
use crate::object::RadioObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slice {
    pub id: u16,
    pub initialized: bool,

    pub in_use: bool,
    /// Dial frequency.
    pub frequency: Hz,
    /// Demodulation mode (`USB`, `LSB`, `CW`, `DIGU`, ...).
    pub mode: String,
    pub mode_list: CommaList,
    /// Panadapter this slice is displayed in.
    pub panadapter: StreamId,
    pub client_handle: ClientHandle,
    /// Single letter label (`A`, `B`, ...).
    pub index_letter: String,
    pub active: bool,
    pub locked: bool,
    pub owner: u32,
    pub sample_rate: u32,
    pub rx_ant: String,
    pub rx_ant_list: CommaList,
    pub tx_ant: String,
    pub tx_ant_list: CommaList,
    /// Passband edges relative to the dial frequency, in Hz.
    pub filter_lo: i32,
    pub filter_hi: i32,
    pub tx: bool,
    pub dax: u8,
    pub dax_clients: u32,
    pub rf_gain: i32,
    pub wide: bool,

    pub agc_mode: String,
    pub agc_threshold: i32,
    pub agc_off_level: i32,
    pub audio_level: i32,
    pub audio_pan: i32,
    pub audio_mute: bool,

    pub nb: bool,
    pub nb_level: i32,
    pub nr: bool,
    pub nr_level: i32,
    pub wnb: bool,
    pub wnb_level: i32,
    pub anf: bool,
    pub anf_level: i32,
    pub apf: bool,
    pub apf_level: i32,
    pub squelch: bool,
    pub squelch_level: i32,
    pub diversity: bool,

    pub rit_on: bool,
    pub rit_freq: i32,
    pub xit_on: bool,
    pub xit_freq: i32,
    pub step: u32,
    pub step_list: CommaList,
    pub record: bool,
    pub play: String,

    pub fm_tone_mode: String,
    pub fm_tone_value: String,
    pub fm_repeater_offset_freq: f64,
    pub tx_offset_freq: f64,
    pub repeater_offset_dir: String,
    pub fm_deviation: i32,
    pub rtty_mark: i32,
    pub rtty_shift: i32,
    pub digl_offset: i32,
    pub digu_offset: i32,
}

crate::property_table!(Slice {
    "in_use" => in_use,
    "RF_frequency" => frequency,
    "mode" => mode,
    "mode_list" => mode_list,
    "pan" => panadapter,
    "client_handle" => client_handle,
    "index_letter" => index_letter,
    "active" => active,
    "lock" => locked,
    "owner" => owner,
    "sample_rate" => sample_rate,
    "rxant" => rx_ant,
    "ant_list" => rx_ant_list,
    "txant" => tx_ant,
    "tx_ant_list" => tx_ant_list,
    "filter_lo" => filter_lo,
    "filter_hi" => filter_hi,
    "tx" => tx,
    "dax" => dax,
    "dax_clients" => dax_clients,
    "rfgain" => rf_gain,
    "wide" => wide,
    "agc_mode" => agc_mode,
    "agc_threshold" => agc_threshold,
    "agc_off_level" => agc_off_level,
    "audio_level" => audio_level,
    "audio_pan" => audio_pan,
    "audio_mute" => audio_mute,
    "nb" => nb,
    "nb_level" => nb_level,
    "nr" => nr,
    "nr_level" => nr_level,
    "wnb" => wnb,
    "wnb_level" => wnb_level,
    "anf" => anf,
    "anf_level" => anf_level,
    "apf" => apf,
    "apf_level" => apf_level,
    "squelch" => squelch,
    "squelch_level" => squelch_level,
    "diversity" => diversity,
    "rit_on" => rit_on,
    "rit_freq" => rit_freq,
    "xit_on" => xit_on,
    "xit_freq" => xit_freq,
    "step" => step,
    "step_list" => step_list,
    "record" => record,
    "play" => play,
    "fm_tone_mode" => fm_tone_mode,
    "fm_tone_value" => fm_tone_value,
    "fm_repeater_offset_freq" => fm_repeater_offset_freq,
    "tx_offset_freq" => tx_offset_freq,
    "repeater_offset_dir" => repeater_offset_dir,
    "fm_deviation" => fm_deviation,
    "rtty_mark" => rtty_mark,
    "rtty_shift" => rtty_shift,
    "digl_offset" => digl_offset,
    "digu_offset" => digu_offset,
} fallback = legacy_property);

crate::lifecycle!(Slice, |s| !s.frequency.is_zero() && !s.mode.is_empty());

impl Slice {
    /// Older firmware spells a few tokens differently.
    fn legacy_property(&mut self, token: &str, value: &str) -> bool {
        use crate::codec::WireValue;
        match token {
            "freq" => self.frequency = Hz::decode_wire(value),
            "audio_gain" => self.audio_level = i32::decode_wire(value),
            _ => return false,
        }
        true
    }
}

impl RadioObject for Slice {
    type Id = u16;
    const KIND: ObjectKind = ObjectKind::Slice;
    const REMOVAL: Option<&'static str> = Some("in_use=0");

    fn with_id(id: u16) -> Self {
        Slice {
            id,
            ..Slice::default()
        }
    }

    fn id(&self) -> &u16 {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tokenize;
    use crate::collection::ObjectCollection;
    use crate::object::{Lifecycle, PropertyTable};

    #[test]
    fn slice_status_populates_fields() {
        let mut slices = ObjectCollection::<Slice>::new();
        let pairs = tokenize(
            "0 in_use=1 RF_frequency=14.074000 mode=DIGU pan=0x40000000 filter_lo=100 filter_hi=2900 rxant=ANT1 step_list=1,10,100",
            ' ',
        );
        let changes = slices.parse_status(&pairs, true);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].added);
        assert!(changes[0].initialized);

        let s = slices.get(&0).unwrap();
        assert!(s.in_use);
        assert_eq!(s.frequency, Hz(14_074_000));
        assert_eq!(s.mode, "DIGU");
        assert_eq!(s.panadapter, StreamId::new(0x4000_0000));
        assert_eq!(s.filter_hi, 2900);
        assert_eq!(s.step_list.0, vec!["1", "10", "100"]);
    }

    #[test]
    fn slice_needs_mode_and_frequency() {
        let mut s = Slice::with_id(1);
        s.apply_property("RF_frequency", "7.000000");
        assert!(!s.check_initialized());
        s.apply_property("mode", "CW");
        assert!(s.check_initialized());
    }

    #[test]
    fn legacy_tokens() {
        let mut s = Slice::with_id(0);
        assert!(s.apply_property("freq", "3.573000"));
        assert!(s.apply_property("audio_gain", "40"));
        assert_eq!(s.frequency, Hz(3_573_000));
        assert_eq!(s.audio_level, 40);
    }

    #[test]
    fn in_use_zero_removes() {
        let mut slices = ObjectCollection::<Slice>::new();
        slices.parse_status(&tokenize("2 in_use=1 mode=USB", ' '), true);
        let changes = slices.parse_status(&tokenize("2 in_use=0", ' '), false);
        assert!(changes[0].removed);
        assert!(!slices.exists(&2));
    }
}
