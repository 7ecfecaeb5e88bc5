//! Outbound SmartSDR command strings.
//!
//! Only the framing and a handful of verbs live here; the session layer
//! prefixes each command with `C<seq>|` when it assigns a sequence number.
//! Setter values are built from a tagged [`CommandValue`] so each token is
//! rendered according to its declared field type.

use std::fmt;

use flexlib_core::{StreamId, StreamKind};

use crate::codec::{Hz, hz_to_mhz};

// ---------------------------------------------------------------------------
// Command encoding
// ---------------------------------------------------------------------------

/// Encode a SmartSDR command with the given sequence number.
///
/// Format: `C<seq>|<command>\n`
pub fn encode_command(seq: u32, command: &str) -> Vec<u8> {
    format!("C{seq}|{command}\n").into_bytes()
}

// ---------------------------------------------------------------------------
// Typed setter values
// ---------------------------------------------------------------------------

/// A setter argument, tagged with how it is spelled on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandValue {
    Int(i64),
    Float(f64),
    /// Rendered as `1` / `0`.
    Bool(bool),
    /// Embedded spaces are sent as 0x7F.
    Text(String),
    /// Rendered as `0x%08X`.
    HexId(u32),
    /// Rendered as MHz with six decimals.
    Frequency(Hz),
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandValue::Int(v) => write!(f, "{v}"),
            CommandValue::Float(v) => write!(f, "{v}"),
            CommandValue::Bool(v) => write!(f, "{}", if *v { 1 } else { 0 }),
            CommandValue::Text(v) => write!(f, "{}", v.replace(' ', "\u{7f}")),
            CommandValue::HexId(v) => write!(f, "0x{v:08X}"),
            CommandValue::Frequency(hz) => write!(f, "{:.6}", hz_to_mhz(hz.0)),
        }
    }
}

impl From<i64> for CommandValue {
    fn from(v: i64) -> Self {
        CommandValue::Int(v)
    }
}

impl From<i32> for CommandValue {
    fn from(v: i32) -> Self {
        CommandValue::Int(v.into())
    }
}

impl From<u32> for CommandValue {
    fn from(v: u32) -> Self {
        CommandValue::Int(v.into())
    }
}

impl From<f64> for CommandValue {
    fn from(v: f64) -> Self {
        CommandValue::Float(v)
    }
}

impl From<bool> for CommandValue {
    fn from(v: bool) -> Self {
        CommandValue::Bool(v)
    }
}

impl From<&str> for CommandValue {
    fn from(v: &str) -> Self {
        CommandValue::Text(v.to_string())
    }
}

impl From<String> for CommandValue {
    fn from(v: String) -> Self {
        CommandValue::Text(v)
    }
}

impl From<StreamId> for CommandValue {
    fn from(v: StreamId) -> Self {
        CommandValue::HexId(v.raw())
    }
}

impl From<Hz> for CommandValue {
    fn from(v: Hz) -> Self {
        CommandValue::Frequency(v)
    }
}

// ---------------------------------------------------------------------------
// Command builders
//
// Each builder returns the command string WITHOUT the `C<seq>|` prefix.
// ---------------------------------------------------------------------------

/// Build a generic property setter.
///
/// Example output: `"slice set 0 mode=USB"`
pub fn cmd_set(object: &str, id: impl fmt::Display, token: &str, value: &CommandValue) -> String {
    format!("{object} set {id} {token}={value}")
}

/// Build a setter for a single-instance object, which has no identifier.
///
/// Example output: `"transmit set rfpower=50"`
pub fn cmd_set_single(object: &str, token: &str, value: &CommandValue) -> String {
    format!("{object} set {token}={value}")
}

/// Build a slice tune command.
///
/// Example output: `"slice tune 0 14.250000 autopan=1"`
pub fn cmd_slice_tune(slice: u16, freq: Hz, autopan: bool) -> String {
    format!(
        "slice tune {} {:.6} autopan={}",
        slice,
        freq.mhz(),
        if autopan { 1 } else { 0 }
    )
}

/// Start an ATU tune cycle.
pub fn cmd_atu_start() -> String {
    "atu start".to_string()
}

/// Ask for the radio's identity and configuration.
pub fn cmd_info() -> String {
    "info".to_string()
}

/// Ask for firmware component versions.
pub fn cmd_version() -> String {
    "version".to_string()
}

/// Ask for the indices of existing slices.
pub fn cmd_slice_list() -> String {
    "slice list".to_string()
}

/// Ask for the receive antenna ports.
pub fn cmd_ant_list() -> String {
    "ant list".to_string()
}

/// Ask for the available microphone inputs.
pub fn cmd_mic_list() -> String {
    "mic list".to_string()
}

/// Ask for the radio's uptime in seconds.
pub fn cmd_radio_uptime() -> String {
    "radio uptime".to_string()
}

/// Build a subscribe command.
///
/// Example output: `"sub slice all"`
pub fn cmd_subscribe(object: &str) -> String {
    format!("sub {object}")
}

/// Build a client program registration command.
///
/// Example output: `"client program flexlib"`
pub fn cmd_client_program(name: &str) -> String {
    format!("client program {name}")
}

/// Build a client station name command.
pub fn cmd_client_station(name: &str) -> String {
    format!("client station {}", name.replace(' ', "\u{7f}"))
}

/// Request a new stream of the given kind.
///
/// DAX audio streams are bound to a channel (1-8); DAX IQ streams to an IQ
/// channel; remote audio streams take no channel. The radio replies with
/// the hex stream id that also tags the stream's VITA-49 packets.
///
/// Example output: `"stream create type=dax_rx dax_channel=1"`
pub fn cmd_stream_create(kind: StreamKind, channel: Option<u8>) -> String {
    match (kind, channel) {
        (StreamKind::DaxIq, Some(ch)) => {
            format!("stream create type={} daxiq_channel={ch}", kind.wire_name())
        }
        (_, Some(ch)) => format!("stream create type={} dax_channel={ch}", kind.wire_name()),
        (_, None) => format!("stream create type={}", kind.wire_name()),
    }
}

/// Remove an active stream.
///
/// Example output: `"stream remove 0x20000001"`
pub fn cmd_stream_remove(stream_id: StreamId) -> String {
    format!("stream remove {stream_id}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
