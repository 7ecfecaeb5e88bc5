//! VITA-49.0 packet decoding for the SmartSDR data connection.
//!
//! FlexRadio streams real-time data over UDP port 4991 as VITA-49.0
//! extension-data packets. This module is a pure parser: it decodes the
//! 28-byte header into the fields the stream processors need (4-bit
//! sequence counter, stream id, packet class code) and hands back the
//! payload slice without copying it.
//!
//! [`encode_packet`] is the inverse, used for the client's own transmit
//! streams (DAX TX, remote TX audio).

use bytes::{Buf, BufMut, Bytes, BytesMut};

use flexlib_core::{Error, Result, StreamId};

/// VITA-49 header size in bytes.
pub const HEADER_SIZE: usize = 28;

/// FlexRadio OUI (Organizationally Unique Identifier).
pub const FLEXRADIO_OUI: u32 = 0x001C2D;

/// Information class code FlexRadio places in every packet.
pub const FLEX_INFO_CLASS: u16 = 0x534C;

/// Packet class codes, as carried in the low 16 bits of the class id.
pub mod class {
    pub const METER: u16 = 0x8002;
    pub const PANADAPTER: u16 = 0x8003;
    pub const WATERFALL: u16 = 0x8004;
    pub const OPUS: u16 = 0x8005;
    pub const DAX_IQ_24K: u16 = 0x02E3;
    pub const DAX_IQ_48K: u16 = 0x02E4;
    pub const DAX_IQ_96K: u16 = 0x02E5;
    pub const DAX_IQ_192K: u16 = 0x02E6;
    pub const DAX_AUDIO: u16 = 0x03E3;
    pub const DAX_REDUCED_BW: u16 = 0x0123;
    pub const DISCOVERY: u16 = 0xFFFF;
}

/// Stream type identified by the packet class code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    /// Meter data (id/value pairs).
    Meter,
    /// Panadapter (FFT) frame segments.
    Panadapter,
    /// Waterfall line segments.
    Waterfall,
    /// Opus-compressed remote audio.
    Opus,
    /// DAX IQ, float32 pairs, at the given sample rate.
    DaxIq(u32),
    /// DAX audio, 24 ksps stereo float32.
    DaxAudio,
    /// Reduced-bandwidth DAX audio, int16 mono.
    DaxReducedBandwidth,
    /// Discovery broadcast.
    Discovery,
    /// Unrecognized class code.
    Unknown(u16),
}

/// Derive the stream type from a packet class code.
pub fn stream_type_from_class_code(code: u16) -> StreamType {
    match code {
        class::METER => StreamType::Meter,
        class::PANADAPTER => StreamType::Panadapter,
        class::WATERFALL => StreamType::Waterfall,
        class::OPUS => StreamType::Opus,
        class::DAX_IQ_24K => StreamType::DaxIq(24_000),
        class::DAX_IQ_48K => StreamType::DaxIq(48_000),
        class::DAX_IQ_96K => StreamType::DaxIq(96_000),
        class::DAX_IQ_192K => StreamType::DaxIq(192_000),
        class::DAX_AUDIO => StreamType::DaxAudio,
        class::DAX_REDUCED_BW => StreamType::DaxReducedBandwidth,
        class::DISCOVERY => StreamType::Discovery,
        other => StreamType::Unknown(other),
    }
}

/// A decoded data-connection packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPacket<'a> {
    /// 4-bit rolling packet counter (0-15).
    pub sequence: u8,
    /// Stream the packet belongs to.
    pub stream_id: StreamId,
    /// Packet class code selecting the payload layout.
    pub class_code: u16,
    /// Integer timestamp in seconds.
    pub timestamp_int: u32,
    /// Fractional timestamp.
    pub timestamp_frac: u64,
    /// Payload bytes after the header (and before any trailer).
    pub payload: &'a [u8],
}

impl StreamPacket<'_> {
    pub fn payload_length(&self) -> usize {
        self.payload.len()
    }

    pub fn stream_type(&self) -> StreamType {
        stream_type_from_class_code(self.class_code)
    }
}

/// Parse a packet from a raw UDP datagram.
///
/// The declared packet size must not exceed the buffer; bytes beyond the
/// declared size are ignored.
pub fn parse_packet(data: &[u8]) -> Result<StreamPacket<'_>> {
    if data.len() < HEADER_SIZE {
        return Err(Error::InvalidFrame(format!(
            "VITA-49 packet too short: {} bytes, minimum is {}",
            data.len(),
            HEADER_SIZE
        )));
    }

    let mut hdr = &data[..HEADER_SIZE];

    let header_word = hdr.get_u32();
    let trailer_present = (header_word >> 26) & 1 == 1;
    let sequence = ((header_word >> 16) & 0x0F) as u8;
    let packet_size_words = (header_word & 0xFFFF) as usize;

    let packet_size_bytes = packet_size_words * 4;
    if packet_size_bytes > data.len() {
        return Err(Error::InvalidFrame(format!(
            "VITA-49 packet_size ({packet_size_words} words = {packet_size_bytes} bytes) exceeds buffer length ({} bytes)",
            data.len()
        )));
    }
    if packet_size_bytes < HEADER_SIZE {
        return Err(Error::InvalidFrame(format!(
            "VITA-49 packet_size ({packet_size_words} words) smaller than header"
        )));
    }

    let stream_id = StreamId::new(hdr.get_u32());

    // Pad-bit count and reserved bits sit above the 24-bit OUI.
    let class_oui = hdr.get_u32() & 0x00FF_FFFF;
    if class_oui != FLEXRADIO_OUI {
        tracing::trace!(
            oui = format!("0x{class_oui:06X}"),
            "VITA-49 packet OUI does not match FlexRadio"
        );
    }

    let class_code = (hdr.get_u32() & 0xFFFF) as u16;
    let timestamp_int = hdr.get_u32();
    let timestamp_frac = hdr.get_u64();

    let mut end = packet_size_bytes;
    if trailer_present && end >= HEADER_SIZE + 4 {
        end -= 4;
    }

    Ok(StreamPacket {
        sequence,
        stream_id,
        class_code,
        timestamp_int,
        timestamp_frac,
        payload: &data[HEADER_SIZE..end],
    })
}

/// Largest payload whose padded packet still fits the 16-bit size field.
pub const MAX_PAYLOAD_SIZE: usize = 0xFFFF * 4 - HEADER_SIZE;

/// Encode an outbound extension-data packet.
///
/// The payload is padded to a 32-bit boundary. Payloads longer than
/// [`MAX_PAYLOAD_SIZE`] are refused.
pub fn encode_packet(stream_id: StreamId, class_code: u16, sequence: u8, payload: &[u8]) -> Result<Bytes> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(Error::InvalidParameter(format!(
            "payload of {} bytes exceeds the {MAX_PAYLOAD_SIZE} byte packet limit",
            payload.len()
        )));
    }
    let padded = payload.len().div_ceil(4) * 4;
    let size_words = (HEADER_SIZE + padded) / 4;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + padded);

    // Extension data with stream id, class id present, TSI=UTC, TSF=sample count.
    let header_word: u32 = (0x3 << 28)
        | (1 << 27)
        | (0x1 << 22)
        | (0x1 << 20)
        | (u32::from(sequence & 0x0F) << 16)
        | size_words as u32;
    buf.put_u32(header_word);
    buf.put_u32(stream_id.raw());
    buf.put_u32(FLEXRADIO_OUI);
    buf.put_u32((u32::from(FLEX_INFO_CLASS) << 16) | u32::from(class_code));
    buf.put_u32(0);
    buf.put_u64(0);
    buf.put_slice(payload);
    buf.put_bytes(0, padded - payload.len());

    Ok(buf.freeze())
}

/// A single meter reading extracted from a meter packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterReading {
    /// Meter id (assigned dynamically by the radio).
    pub meter_id: u16,
    /// Raw value in the meter's fixed-point units.
    pub value: i16,
}

/// Extract meter readings from a meter packet's payload.
///
/// Each reading is 4 bytes: a u16 meter id then an i16 value, big-endian.
pub fn parse_meter_payload(payload: &[u8]) -> Result<Vec<MeterReading>> {
    if payload.len() % 4 != 0 {
        return Err(Error::InvalidFrame(format!(
            "meter payload length {} is not divisible by 4",
            payload.len()
        )));
    }

    let mut buf = payload;
    let mut readings = Vec::with_capacity(payload.len() / 4);
    while buf.has_remaining() {
        let meter_id = buf.get_u16();
        let value = buf.get_i16();
        readings.push(MeterReading { meter_id, value });
    }
    Ok(readings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
