//! Panadapters (`display pan`) and waterfalls (`display waterfall`).
//!
//! Both are identified by the hex stream id that also tags their VITA-49
//! packets, which is the second token of the status body. Each owns the
//! reassembler that turns its packet segments back into whole frames.

use flexlib_core::{ClientHandle, ObjectKind, StreamId};

use crate::codec::{CommaList, Hz};
use crate::object::{IdRule, RadioObject};
use crate::stream::reassembly::SegmentOutcome;
use crate::stream::{
    DelegateSlot, FrameReassembler, PANADAPTER_POOL_SIZE, PanadapterFrame, WATERFALL_POOL_SIZE,
    WaterfallFrame,
};

// ---------------------------------------------------------------------------
// Panadapter
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Panadapter {
    pub id: StreamId,
    pub initialized: bool,
    /// Set by the first data packet.
    pub is_streaming: bool,

    pub client_handle: ClientHandle,
    pub center: Hz,
    pub bandwidth: Hz,
    pub min_bw: Hz,
    pub max_bw: Hz,
    pub min_dbm: f64,
    pub max_dbm: f64,
    pub fps: u32,
    pub average: u32,
    pub weighted_average: bool,
    pub rf_gain: i32,
    pub rx_ant: String,
    pub ant_list: CommaList,
    pub wide: bool,
    pub loop_a: bool,
    pub loop_b: bool,
    pub band: String,
    pub band_zoom: bool,
    pub segment_zoom: bool,
    pub wnb: bool,
    pub wnb_level: i32,
    pub wnb_updating: bool,
    pub x_pixels: u32,
    pub y_pixels: u32,
    pub waterfall: StreamId,
    pub daxiq_channel: u8,
    pub daxiq_rate: u32,
    pub preamp: String,
    pub xvtr: String,

    pub reassembler: FrameReassembler<PanadapterFrame>,
    pub delegate: DelegateSlot<PanadapterFrame>,
}

crate::property_table!(Panadapter {
    "client_handle" => client_handle,
    "center" => center,
    "bandwidth" => bandwidth,
    "min_bw" => min_bw,
    "max_bw" => max_bw,
    "min_dbm" => min_dbm,
    "max_dbm" => max_dbm,
    "fps" => fps,
    "average" => average,
    "weighted_average" => weighted_average,
    "rfgain" => rf_gain,
    "rxant" => rx_ant,
    "ant_list" => ant_list,
    "wide" => wide,
    "loopa" => loop_a,
    "loopb" => loop_b,
    "band" => band,
    "band_zoom" => band_zoom,
    "segment_zoom" => segment_zoom,
    "wnb" => wnb,
    "wnb_level" => wnb_level,
    "wnb_updating" => wnb_updating,
    "x_pixels" => x_pixels,
    "y_pixels" => y_pixels,
    "waterfall" => waterfall,
    "daxiq_channel" => daxiq_channel,
    "daxiq_rate" => daxiq_rate,
    "pre" => preamp,
    "xvtr" => xvtr,
} fallback = legacy_property);

crate::lifecycle!(Panadapter, |p| {
    !p.center.is_zero() && !p.bandwidth.is_zero() && (p.min_dbm != 0.0 || p.max_dbm != 0.0)
});

impl Panadapter {
    fn legacy_property(&mut self, token: &str, value: &str) -> bool {
        use crate::codec::WireValue;
        match token {
            "xpixels" => self.x_pixels = u32::decode_wire(value),
            "ypixels" => self.y_pixels = u32::decode_wire(value),
            "daxiq" => self.daxiq_channel = u8::decode_wire(value),
            _ => return false,
        }
        true
    }

    /// Feed one segment payload to the reassembler.
    pub fn push_segment(&mut self, payload: &[u8]) -> SegmentOutcome {
        self.is_streaming = true;
        self.reassembler.push(payload, self.delegate.get())
    }
}

impl RadioObject for Panadapter {
    type Id = StreamId;
    const KIND: ObjectKind = ObjectKind::Panadapter;
    const ID_RULE: IdRule = IdRule::Second;

    fn with_id(id: StreamId) -> Self {
        Panadapter {
            id,
            initialized: false,
            is_streaming: false,
            client_handle: ClientHandle::NONE,
            center: Hz::default(),
            bandwidth: Hz::default(),
            min_bw: Hz::default(),
            max_bw: Hz::default(),
            min_dbm: 0.0,
            max_dbm: 0.0,
            fps: 0,
            average: 0,
            weighted_average: false,
            rf_gain: 0,
            rx_ant: String::new(),
            ant_list: CommaList::default(),
            wide: false,
            loop_a: false,
            loop_b: false,
            band: String::new(),
            band_zoom: false,
            segment_zoom: false,
            wnb: false,
            wnb_level: 0,
            wnb_updating: false,
            x_pixels: 0,
            y_pixels: 0,
            waterfall: StreamId::default(),
            daxiq_channel: 0,
            daxiq_rate: 0,
            preamp: String::new(),
            xvtr: String::new(),
            reassembler: FrameReassembler::new(PANADAPTER_POOL_SIZE),
            delegate: DelegateSlot::default(),
        }
    }

    fn id(&self) -> &StreamId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Waterfall
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Waterfall {
    pub id: StreamId,
    pub initialized: bool,
    pub is_streaming: bool,

    pub client_handle: ClientHandle,
    /// The panadapter this waterfall belongs to.
    pub panadapter: StreamId,
    pub auto_black: bool,
    pub black_level: i32,
    pub color_gain: i32,
    pub gradient_index: u32,
    pub line_duration: u32,
    pub x_pixels: u32,
    pub center: Hz,
    pub bandwidth: Hz,
    pub band_zoom: bool,
    pub segment_zoom: bool,
    pub wide: bool,
    pub xvtr: String,

    pub reassembler: FrameReassembler<WaterfallFrame>,
    pub delegate: DelegateSlot<WaterfallFrame>,
}

crate::property_table!(Waterfall {
    "client_handle" => client_handle,
    "panadapter" => panadapter,
    "auto_black" => auto_black,
    "black_level" => black_level,
    "color_gain" => color_gain,
    "gradient_index" => gradient_index,
    "line_duration" => line_duration,
    "x_pixels" => x_pixels,
    "center" => center,
    "bandwidth" => bandwidth,
    "band_zoom" => band_zoom,
    "segment_zoom" => segment_zoom,
    "wide" => wide,
    "xvtr" => xvtr,
});

crate::lifecycle!(Waterfall, |w| w.panadapter.raw() != 0);

impl Waterfall {
    pub fn push_segment(&mut self, payload: &[u8]) -> SegmentOutcome {
        self.is_streaming = true;
        self.reassembler.push(payload, self.delegate.get())
    }
}

impl RadioObject for Waterfall {
    type Id = StreamId;
    const KIND: ObjectKind = ObjectKind::Waterfall;
    const ID_RULE: IdRule = IdRule::Second;

    fn with_id(id: StreamId) -> Self {
        Waterfall {
            id,
            initialized: false,
            is_streaming: false,
            client_handle: ClientHandle::NONE,
            panadapter: StreamId::default(),
            auto_black: false,
            black_level: 0,
            color_gain: 0,
            gradient_index: 0,
            line_duration: 0,
            x_pixels: 0,
            center: Hz::default(),
            bandwidth: Hz::default(),
            band_zoom: false,
            segment_zoom: false,
            wide: false,
            xvtr: String::new(),
            reassembler: FrameReassembler::new(WATERFALL_POOL_SIZE),
            delegate: DelegateSlot::default(),
        }
    }

    fn id(&self) -> &StreamId {
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

    #[test]
    fn panadapter_from_display_line() {
        let mut pans = ObjectCollection::<Panadapter>::new();
        let pairs = tokenize(
            "pan 0x40000000 center=14.100000 bandwidth=0.200000 min_dbm=-135.0 max_dbm=-40.0 fps=25 waterfall=0x42000000",
            ' ',
        );
        let changes = pans.parse_status(&pairs, true);
        assert!(changes[0].added);
        assert!(changes[0].initialized);

        let p = pans.get(&StreamId::new(0x4000_0000)).unwrap();
        assert_eq!(p.center, Hz(14_100_000));
        assert_eq!(p.bandwidth, Hz(200_000));
        assert_eq!(p.max_dbm, -40.0);
        assert_eq!(p.waterfall, StreamId::new(0x4200_0000));
        assert_eq!(p.reassembler.pool_size(), PANADAPTER_POOL_SIZE);
        assert!(!p.is_streaming);
    }

    #[test]
    fn panadapter_waits_for_levels() {
        let mut pans = ObjectCollection::<Panadapter>::new();
        let changes = pans.parse_status(
            &tokenize("pan 0x40000001 center=7.1 bandwidth=0.2", ' '),
            true,
        );
        assert!(!changes[0].initialized);
        let changes = pans.parse_status(&tokenize("pan 0x40000001 max_dbm=-10", ' '), true);
        assert!(changes[0].initialized);
    }

    #[test]
    fn waterfall_initializes_on_parent() {
        let mut wfs = ObjectCollection::<Waterfall>::new();
        let changes = wfs.parse_status(
            &tokenize("waterfall 0x42000000 panadapter=0x40000000 line_duration=100", ' '),
            true,
        );
        assert!(changes[0].initialized);
        let w = wfs.get(&StreamId::new(0x4200_0000)).unwrap();
        assert_eq!(w.reassembler.pool_size(), WATERFALL_POOL_SIZE);
    }

    #[test]
    fn push_segment_marks_streaming() {
        let mut p = Panadapter::with_id(StreamId::new(0x4000_0000));
        let mut seg = Vec::new();
        for v in [0u16, 1, 2, 1] {
            seg.extend_from_slice(&v.to_be_bytes());
        }
        seg.extend_from_slice(&0u32.to_be_bytes());
        seg.extend_from_slice(&0x1234u16.to_be_bytes());
        assert_eq!(p.push_segment(&seg), SegmentOutcome::Completed);
        assert!(p.is_streaming);
    }
}
