//! Identifier and classification types shared across flexlib.

use std::fmt;
use std::str::FromStr;

/// Parse a hex token with an optional `0x`/`0X` prefix.
fn parse_hex_u32(s: &str) -> Option<u32> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).ok()
}

/// Identifier of a VITA-49 stream (panadapter, waterfall, DAX, remote audio).
///
/// On the wire it appears as a hex token (`0x40000000`); the same value is
/// carried in the Stream ID field of every UDP packet belonging to the
/// stream, which is how the data path finds the owning object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StreamId(u32);

impl StreamId {
    /// Wrap a raw stream identifier.
    pub const fn new(raw: u32) -> Self {
        StreamId(raw)
    }

    /// Return the raw 32-bit value.
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Parse a hex token, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Option<Self> {
        parse_hex_u32(s).map(StreamId)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl From<u32> for StreamId {
    fn from(raw: u32) -> Self {
        StreamId(raw)
    }
}

/// Handle the radio assigns to each connected client.
///
/// Received as `H<hex>` during the handshake and prefixed to every status
/// line (`S<hex>|...`). Handle `0` means "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ClientHandle(u32);

impl ClientHandle {
    /// The "no client" handle.
    pub const NONE: ClientHandle = ClientHandle(0);

    /// Wrap a raw handle value.
    pub const fn new(raw: u32) -> Self {
        ClientHandle(raw)
    }

    /// Return the raw 32-bit value.
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Whether this is the "no client" handle.
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Parse a hex token, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Option<Self> {
        parse_hex_u32(s).map(ClientHandle)
    }
}

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Every kind of object the status protocol can describe.
///
/// The `Display` form is the name used in log fields and events, which is
/// not always the wire token (`display pan` vs `Panadapter`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Slice,
    Panadapter,
    Waterfall,
    Meter,
    Tnf,
    Memory,
    Equalizer,
    Amplifier,
    BandSetting,
    Xvtr,
    UsbCable,
    Profile,
    GuiClient,
    DaxRxAudioStream,
    DaxTxAudioStream,
    DaxMicAudioStream,
    DaxIqStream,
    RemoteRxAudioStream,
    RemoteTxAudioStream,
    Radio,
    Atu,
    Gps,
    Interlock,
    Transmit,
    Wan,
    Waveform,
}

impl ObjectKind {
    /// Whether this kind has exactly one live instance and no identifier.
    pub fn is_single_instance(&self) -> bool {
        matches!(
            self,
            ObjectKind::Radio
                | ObjectKind::Atu
                | ObjectKind::Gps
                | ObjectKind::Interlock
                | ObjectKind::Transmit
                | ObjectKind::Wan
                | ObjectKind::Waveform
        )
    }

    /// Whether objects of this kind receive VITA-49 data.
    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            ObjectKind::Panadapter
                | ObjectKind::Waterfall
                | ObjectKind::DaxRxAudioStream
                | ObjectKind::DaxTxAudioStream
                | ObjectKind::DaxMicAudioStream
                | ObjectKind::DaxIqStream
                | ObjectKind::RemoteRxAudioStream
                | ObjectKind::RemoteTxAudioStream
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectKind::Slice => "Slice",
            ObjectKind::Panadapter => "Panadapter",
            ObjectKind::Waterfall => "Waterfall",
            ObjectKind::Meter => "Meter",
            ObjectKind::Tnf => "Tnf",
            ObjectKind::Memory => "Memory",
            ObjectKind::Equalizer => "Equalizer",
            ObjectKind::Amplifier => "Amplifier",
            ObjectKind::BandSetting => "BandSetting",
            ObjectKind::Xvtr => "Xvtr",
            ObjectKind::UsbCable => "UsbCable",
            ObjectKind::Profile => "Profile",
            ObjectKind::GuiClient => "GuiClient",
            ObjectKind::DaxRxAudioStream => "DaxRxAudioStream",
            ObjectKind::DaxTxAudioStream => "DaxTxAudioStream",
            ObjectKind::DaxMicAudioStream => "DaxMicAudioStream",
            ObjectKind::DaxIqStream => "DaxIqStream",
            ObjectKind::RemoteRxAudioStream => "RemoteRxAudioStream",
            ObjectKind::RemoteTxAudioStream => "RemoteTxAudioStream",
            ObjectKind::Radio => "Radio",
            ObjectKind::Atu => "Atu",
            ObjectKind::Gps => "Gps",
            ObjectKind::Interlock => "Interlock",
            ObjectKind::Transmit => "Transmit",
            ObjectKind::Wan => "Wan",
            ObjectKind::Waveform => "Waveform",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a stream-type token is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStreamKindError(String);

impl fmt::Display for ParseStreamKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown stream type: {}", self.0)
    }
}

impl std::error::Error for ParseStreamKindError {}

/// The six stream kinds a `stream` status line can describe, keyed by the
/// `type=` token embedded in the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    DaxRx,
    DaxTx,
    DaxMic,
    DaxIq,
    RemoteAudioRx,
    RemoteAudioTx,
}

impl StreamKind {
    /// The wire token used in `type=` and in `stream create` commands.
    pub fn wire_name(&self) -> &'static str {
        match self {
            StreamKind::DaxRx => "dax_rx",
            StreamKind::DaxTx => "dax_tx",
            StreamKind::DaxMic => "dax_mic",
            StreamKind::DaxIq => "dax_iq",
            StreamKind::RemoteAudioRx => "remote_audio_rx",
            StreamKind::RemoteAudioTx => "remote_audio_tx",
        }
    }

    /// The object kind that models streams of this type.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            StreamKind::DaxRx => ObjectKind::DaxRxAudioStream,
            StreamKind::DaxTx => ObjectKind::DaxTxAudioStream,
            StreamKind::DaxMic => ObjectKind::DaxMicAudioStream,
            StreamKind::DaxIq => ObjectKind::DaxIqStream,
            StreamKind::RemoteAudioRx => ObjectKind::RemoteRxAudioStream,
            StreamKind::RemoteAudioTx => ObjectKind::RemoteTxAudioStream,
        }
    }
}

impl FromStr for StreamKind {
    type Err = ParseStreamKindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dax_rx" => Ok(StreamKind::DaxRx),
            "dax_tx" => Ok(StreamKind::DaxTx),
            "dax_mic" => Ok(StreamKind::DaxMic),
            "dax_iq" => Ok(StreamKind::DaxIq),
            "remote_audio_rx" => Ok(StreamKind::RemoteAudioRx),
            "remote_audio_tx" => Ok(StreamKind::RemoteAudioTx),
            _ => Err(ParseStreamKindError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_id_hex_with_prefix() {
        assert_eq!(StreamId::from_hex("0x40000000"), Some(StreamId::new(0x4000_0000)));
        assert_eq!(StreamId::from_hex("0X2A"), Some(StreamId::new(0x2A)));
    }

    #[test]
    fn stream_id_hex_without_prefix() {
        assert_eq!(StreamId::from_hex("42000001"), Some(StreamId::new(0x4200_0001)));
    }

    #[test]
    fn stream_id_rejects_garbage() {
        assert_eq!(StreamId::from_hex("0xZZ"), None);
        assert_eq!(StreamId::from_hex(""), None);
    }

    #[test]
    fn stream_id_display_is_padded_hex() {
        assert_eq!(StreamId::new(0x42).to_string(), "0x00000042");
    }

    #[test]
    fn client_handle_none() {
        assert!(ClientHandle::NONE.is_none());
        assert!(!ClientHandle::new(0x1234).is_none());
        assert_eq!(ClientHandle::default(), ClientHandle::NONE);
    }

    #[test]
    fn client_handle_parse_and_display() {
        let h = ClientHandle::from_hex("6A7B8C9D").unwrap();
        assert_eq!(h.raw(), 0x6A7B_8C9D);
        assert_eq!(h.to_string(), "0x6A7B8C9D");
    }

    #[test]
    fn stream_kind_round_trips_wire_name() {
        for kind in [
            StreamKind::DaxRx,
            StreamKind::DaxTx,
            StreamKind::DaxMic,
            StreamKind::DaxIq,
            StreamKind::RemoteAudioRx,
            StreamKind::RemoteAudioTx,
        ] {
            assert_eq!(kind.wire_name().parse::<StreamKind>(), Ok(kind));
        }
        assert!("opus".parse::<StreamKind>().is_err());
    }

    #[test]
    fn single_instance_kinds() {
        assert!(ObjectKind::Atu.is_single_instance());
        assert!(ObjectKind::Radio.is_single_instance());
        assert!(!ObjectKind::Slice.is_single_instance());
    }

    #[test]
    fn streaming_kinds() {
        assert!(ObjectKind::Panadapter.is_streaming());
        assert!(ObjectKind::DaxIqStream.is_streaming());
        assert!(!ObjectKind::Meter.is_streaming());
    }
}
