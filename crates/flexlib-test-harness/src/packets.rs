//! VITA-49 datagram and segment builders.
//!
//! These produce the exact byte layouts a FlexRadio sends on its data port,
//! so stream tests can feed realistic datagrams to the dispatcher without a
//! radio.

use bytes::{BufMut, Bytes, BytesMut};

/// VITA-49 header size in bytes.
pub const HEADER_SIZE: usize = 28;

/// FlexRadio OUI.
pub const FLEXRADIO_OUI: u32 = 0x001C2D;

/// FlexRadio information class code.
pub const FLEX_INFO_CLASS: u16 = 0x534C;

/// Packet class codes.
pub const METER_CLASS: u16 = 0x8002;
pub const PANADAPTER_CLASS: u16 = 0x8003;
pub const WATERFALL_CLASS: u16 = 0x8004;
pub const OPUS_CLASS: u16 = 0x8005;
pub const DAX_IQ_48K_CLASS: u16 = 0x02E4;
pub const DAX_AUDIO_CLASS: u16 = 0x03E3;
pub const DAX_REDUCED_BW_CLASS: u16 = 0x0123;

/// Build a complete extension-data datagram around `payload`.
///
/// The payload is zero-padded to a 32-bit boundary and the declared packet
/// size covers the padding.
pub fn vita_packet(stream_id: u32, class_code: u16, sequence: u8, payload: &[u8]) -> Bytes {
    let padded = payload.len().div_ceil(4) * 4;
    let size_words = ((HEADER_SIZE + padded) / 4) as u32;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + padded);
    // Extension data with stream id, class id present, TSI=UTC, TSF=sample count.
    buf.put_u32(
        (0x3 << 28)
            | (1 << 27)
            | (0x1 << 22)
            | (0x1 << 20)
            | (u32::from(sequence & 0x0F) << 16)
            | (size_words & 0xFFFF),
    );
    buf.put_u32(stream_id);
    buf.put_u32(FLEXRADIO_OUI);
    buf.put_u32((u32::from(FLEX_INFO_CLASS) << 16) | u32::from(class_code));
    buf.put_u32(0);
    buf.put_u64(0);
    buf.put_slice(payload);
    buf.put_bytes(0, padded - payload.len());
    buf.freeze()
}

/// A meter payload from `(meter_id, raw_value)` pairs.
pub fn meter_payload(readings: &[(u16, i16)]) -> Bytes {
    let mut buf = BytesMut::with_capacity(readings.len() * 4);
    for &(id, value) in readings {
        buf.put_u16(id);
        buf.put_i16(value);
    }
    buf.freeze()
}

/// One panadapter segment: 12-byte header then big-endian u16 bins.
pub fn panadapter_segment(starting_bin: u16, frame_bin_count: u16, frame_number: u32, bins: &[u16]) -> Bytes {
    let mut buf = BytesMut::with_capacity(12 + bins.len() * 2);
    buf.put_u16(starting_bin);
    buf.put_u16(bins.len() as u16);
    buf.put_u16(2);
    buf.put_u16(frame_bin_count);
    buf.put_u32(frame_number);
    for &bin in bins {
        buf.put_u16(bin);
    }
    buf.freeze()
}

/// One waterfall segment: 36-byte header then big-endian u16 bins.
/// Frequencies are in Hz and encoded with 20 fractional bits.
pub fn waterfall_segment(
    first_bin_freq_hz: i64,
    bin_bandwidth_hz: i64,
    starting_bin: u16,
    frame_bin_count: u16,
    frame_number: u32,
    bins: &[u16],
) -> Bytes {
    let mut buf = BytesMut::with_capacity(36 + bins.len() * 2);
    buf.put_i64(first_bin_freq_hz << 20);
    buf.put_i64(bin_bandwidth_hz << 20);
    buf.put_u32(100);
    buf.put_u16(bins.len() as u16);
    buf.put_u16(1);
    buf.put_u32(frame_number);
    buf.put_u32(0);
    buf.put_u16(frame_bin_count);
    buf.put_u16(starting_bin);
    for &bin in bins {
        buf.put_u16(bin);
    }
    buf.freeze()
}

/// Interleaved stereo float32 samples, big-endian.
pub fn float32_payload(samples: &[f32]) -> Bytes {
    let mut buf = BytesMut::with_capacity(samples.len() * 4);
    for &s in samples {
        buf.put_f32(s);
    }
    buf.freeze()
}

/// Mono int16 samples, big-endian (reduced-bandwidth DAX).
pub fn int16_payload(samples: &[i16]) -> Bytes {
    let mut buf = BytesMut::with_capacity(samples.len() * 2);
    for &s in samples {
        buf.put_i16(s);
    }
    buf.freeze()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
