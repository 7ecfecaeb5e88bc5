//! SmartSDR control-line decoding and key/value coercion.
//!
//! The SmartSDR text protocol uses newline-terminated ASCII lines over TCP
//! port 4992. Commands flow from client to radio; replies, status messages,
//! and handshake lines flow from radio to client.
//!
//! # Line formats
//!
//! ```text
//! Reply:     R<seq>|<hex_result>|<data>\n
//! Status:    S<hex_handle>|<type> <key>=<value> ...\n
//! Message:   M<seq>|<hex_code>|<text>\n   (or M<hex_code>|<text>)
//! Version:   V<version string>\n
//! Handle:    H<hex_handle>\n
//! ```
//!
//! Status bodies are tokenized into ordered `(key, value)` pairs. Values are
//! coerced into field types through [`WireValue`], which never fails: text
//! that does not parse yields the type's zero/empty default.
//!
//! All decoding in this module is pure parsing -- no I/O is performed.

use std::fmt;

use flexlib_core::{ClientHandle, Error, Result, StreamId};

// ---------------------------------------------------------------------------
// Frequency conversion helpers
// ---------------------------------------------------------------------------

/// Convert frequency in Hz (`u64`) to MHz (`f64`) for SmartSDR commands.
pub fn hz_to_mhz(hz: u64) -> f64 {
    hz as f64 / 1_000_000.0
}

/// Convert frequency in MHz (`f64`) to Hz (`u64`).
///
/// Negative and non-finite inputs clamp to zero.
pub fn mhz_to_hz(mhz: f64) -> u64 {
    if !mhz.is_finite() || mhz <= 0.0 {
        return 0;
    }
    (mhz * 1_000_000.0).round() as u64
}

/// A radio frequency in hertz.
///
/// On the wire frequencies are MHz text with six decimals
/// (`RF_frequency=14.250000`); in the model they are integer hertz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hz(pub u64);

impl Hz {
    /// The frequency in hertz.
    pub const fn hz(&self) -> u64 {
        self.0
    }

    /// The frequency in MHz.
    pub fn mhz(&self) -> f64 {
        hz_to_mhz(self.0)
    }

    /// Whether the frequency is unset.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Hz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.mhz())
    }
}

// ---------------------------------------------------------------------------
// Scalar coercions
// ---------------------------------------------------------------------------

/// Interpret a protocol boolean. `1`, `true`, `on` and `yes` are true
/// (case-insensitive); everything else is false.
pub fn parse_bool(s: &str) -> bool {
    let s = s.trim();
    s == "1"
        || s.eq_ignore_ascii_case("true")
        || s.eq_ignore_ascii_case("on")
        || s.eq_ignore_ascii_case("yes")
}

/// Parse a signed integer, defaulting to 0.
///
/// Some firmware sends integral properties with a fractional part
/// (`audio_level=50.000000`), so a float that parses is truncated.
pub fn parse_int(s: &str) -> i64 {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return v;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v.trunc() as i64,
        _ => 0,
    }
}

/// Parse a floating point value, defaulting to 0.0.
pub fn parse_float(s: &str) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Parse a hex value with an optional `0x` prefix, defaulting to 0.
pub fn parse_hex(s: &str) -> u32 {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).unwrap_or(0)
}

/// Split a delimited list value, dropping empty entries.
pub fn split_list(s: &str, delimiter: char) -> Vec<String> {
    s.split(delimiter)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Status text encodes embedded spaces as 0x7F.
fn decode_text(s: &str) -> String {
    s.replace('\u{7f}', " ")
}

fn encode_text(s: &str) -> String {
    s.replace(' ', "\u{7f}")
}

// ---------------------------------------------------------------------------
// WireValue
// ---------------------------------------------------------------------------

/// A field type with a defined textual form in status lines.
///
/// `decode_wire` never fails; `encode_wire(decode_wire(s))` is the canonical
/// spelling of `s`, so `decode_wire(encode_wire(v)) == v` for every value.
pub trait WireValue: Sized {
    /// Coerce a status value into this type.
    fn decode_wire(s: &str) -> Self;

    /// Render this value the way the radio sends it.
    fn encode_wire(&self) -> String;
}

impl WireValue for bool {
    fn decode_wire(s: &str) -> Self {
        parse_bool(s)
    }

    fn encode_wire(&self) -> String {
        (if *self { "1" } else { "0" }).to_string()
    }
}

macro_rules! wire_int {
    ($($t:ty),*) => {
        $(
            impl WireValue for $t {
                fn decode_wire(s: &str) -> Self {
                    <$t>::try_from(parse_int(s)).unwrap_or_default()
                }

                fn encode_wire(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

wire_int!(u8, u16, u32, i16, i32, i64);

impl WireValue for u64 {
    fn decode_wire(s: &str) -> Self {
        s.trim()
            .parse::<u64>()
            .unwrap_or_else(|_| u64::try_from(parse_int(s)).unwrap_or_default())
    }

    fn encode_wire(&self) -> String {
        self.to_string()
    }
}

impl WireValue for f64 {
    fn decode_wire(s: &str) -> Self {
        parse_float(s)
    }

    fn encode_wire(&self) -> String {
        self.to_string()
    }
}

impl WireValue for f32 {
    fn decode_wire(s: &str) -> Self {
        match s.trim().parse::<f32>() {
            Ok(v) if v.is_finite() => v,
            _ => 0.0,
        }
    }

    fn encode_wire(&self) -> String {
        self.to_string()
    }
}

impl WireValue for String {
    fn decode_wire(s: &str) -> Self {
        decode_text(s)
    }

    fn encode_wire(&self) -> String {
        encode_text(self)
    }
}

impl WireValue for Hz {
    fn decode_wire(s: &str) -> Self {
        Hz(mhz_to_hz(parse_float(s)))
    }

    fn encode_wire(&self) -> String {
        self.to_string()
    }
}

impl WireValue for StreamId {
    fn decode_wire(s: &str) -> Self {
        StreamId::new(parse_hex(s))
    }

    fn encode_wire(&self) -> String {
        self.to_string()
    }
}

impl WireValue for ClientHandle {
    fn decode_wire(s: &str) -> Self {
        ClientHandle::new(parse_hex(s))
    }

    fn encode_wire(&self) -> String {
        self.to_string()
    }
}

/// A comma-separated list value (`ant_list=ANT1,ANT2,RX_A`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommaList(pub Vec<String>);

impl WireValue for CommaList {
    fn decode_wire(s: &str) -> Self {
        CommaList(split_list(s, ','))
    }

    fn encode_wire(&self) -> String {
        self.0.join(",")
    }
}

/// A caret-separated list value (`rfpower_list=...^...`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaretList(pub Vec<String>);

impl WireValue for CaretList {
    fn decode_wire(s: &str) -> Self {
        CaretList(split_list(s, '^'))
    }

    fn encode_wire(&self) -> String {
        self.0.join("^")
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// An ordered `(key, value)` pair borrowed from a status body.
pub type Pair<'a> = (&'a str, &'a str);

/// Split a status body into ordered `(key, value)` pairs.
///
/// Tokens are delimited by `separator` (space for most objects, `#` for
/// meter and gps). A token without `=` becomes `(token, "")`, which is how
/// identifiers and flag words such as `removed` reach the collections.
pub fn tokenize(body: &str, separator: char) -> Vec<Pair<'_>> {
    body.split(separator)
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| match tok.split_once('=') {
            Some((k, v)) => (k, v),
            None => (tok, ""),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Control lines
// ---------------------------------------------------------------------------

/// A decoded reply to a previously-sent command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Sequence number correlating this reply to the originating command.
    pub sequence: u32,
    /// Result code. `0` means success.
    pub result: u32,
    /// Reply data (may be empty).
    pub data: String,
}

impl Reply {
    /// Whether the result code is the "no error" sentinel.
    pub fn is_ok(&self) -> bool {
        self.result == 0
    }
}

/// A status line, split into its originating handle, type word and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// The client handle the status concerns.
    pub handle: ClientHandle,
    /// First space-delimited word of the payload (`slice`, `display`, ...).
    pub object_type: String,
    /// Everything after the type word.
    pub body: String,
}

/// Severity carried in bits 24-25 of a message code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl MessageSeverity {
    /// Decode the severity field of a message code.
    pub fn from_code(code: u32) -> Self {
        match (code >> 24) & 0x3 {
            0 => MessageSeverity::Info,
            1 => MessageSeverity::Warning,
            2 => MessageSeverity::Error,
            _ => MessageSeverity::Fatal,
        }
    }
}

/// An informational or error message pushed by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioMessage {
    /// Sequence number, when the three-field form was used.
    pub sequence: Option<u32>,
    /// Hex message code.
    pub code: u32,
    /// Message text.
    pub text: String,
}

impl RadioMessage {
    pub fn severity(&self) -> MessageSeverity {
        MessageSeverity::from_code(self.code)
    }
}

/// Types of lines received on the control connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlLine {
    /// Handshake version line: `V1.4.0.0`
    Version(String),
    /// Handshake client handle: `H12345678`
    Handle(ClientHandle),
    /// Reply to a command: `R<seq>|<result>|<data>`
    Reply(Reply),
    /// Status update: `S<handle>|<type> <kv>...`
    Status(StatusLine),
    /// Message: `M<seq>|<code>|<text>`
    Message(RadioMessage),
    /// An unrecognised line.
    Unknown(String),
}

/// Classify and parse a single control line.
///
/// The line should NOT include the trailing `\n`. Leading/trailing whitespace
/// is stripped. A line missing its required delimiters is a
/// [`Error::MalformedLine`].
pub fn parse_line(line: &str) -> Result<ControlLine> {
    let line = line.trim();
    let Some(first) = line.chars().next() else {
        return Err(Error::MalformedLine("empty line".into()));
    };
    let body = &line[first.len_utf8()..];

    match first {
        'V' => Ok(ControlLine::Version(body.to_string())),
        'H' => parse_handle(body),
        'R' => parse_reply(body).map(ControlLine::Reply),
        'S' => parse_status(body, line),
        'M' => parse_message(body, line),
        _ => Ok(ControlLine::Unknown(line.to_string())),
    }
}

fn parse_handle(body: &str) -> Result<ControlLine> {
    ClientHandle::from_hex(body)
        .map(ControlLine::Handle)
        .ok_or_else(|| Error::Protocol(format!("invalid hex handle: {body}")))
}

/// Parse a reply body (the line without its leading `R`):
/// `<seq>|<hex_result>|<data>`.
pub fn parse_reply(body: &str) -> Result<Reply> {
    let mut parts = body.splitn(3, '|');
    let seq = parts.next().unwrap_or_default();
    let Some(result) = parts.next() else {
        return Err(Error::MalformedLine(format!(
            "reply needs at least seq|result: {body}"
        )));
    };

    let sequence = seq
        .trim()
        .parse::<u32>()
        .map_err(|_| Error::MalformedLine(format!("invalid reply sequence number: {seq}")))?;
    let result = u32::from_str_radix(result.trim(), 16)
        .map_err(|_| Error::MalformedLine(format!("invalid reply result code: {result}")))?;
    let data = parts.next().unwrap_or_default().to_string();

    Ok(Reply {
        sequence,
        result,
        data,
    })
}

fn parse_status(body: &str, line: &str) -> Result<ControlLine> {
    let (handle_str, payload) = body
        .split_once('|')
        .ok_or_else(|| Error::MalformedLine(format!("status has no pipe: {line}")))?;

    let handle = ClientHandle::from_hex(handle_str)
        .ok_or_else(|| Error::MalformedLine(format!("invalid status handle: {handle_str}")))?;

    let payload = payload.trim_start();
    let (object_type, rest) = payload.split_once(' ').unwrap_or((payload, ""));
    if object_type.is_empty() {
        return Err(Error::MalformedLine(format!("status has no type: {line}")));
    }

    Ok(ControlLine::Status(StatusLine {
        handle,
        object_type: object_type.to_string(),
        body: rest.trim().to_string(),
    }))
}

fn parse_message(body: &str, line: &str) -> Result<ControlLine> {
    let parts: Vec<&str> = body.splitn(3, '|').collect();
    let msg = match parts.as_slice() {
        [seq, code, text] => RadioMessage {
            sequence: seq.trim().parse::<u32>().ok(),
            code: parse_hex(code),
            text: text.to_string(),
        },
        [code, text] => RadioMessage {
            sequence: None,
            code: parse_hex(code),
            text: text.to_string(),
        },
        _ => {
            return Err(Error::MalformedLine(format!("message has no pipe: {line}")));
        }
    };
    Ok(ControlLine::Message(msg))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Frequency conversion -----------------------------------------------

    #[test]
    fn frequency_round_trip() {
        let test_freqs: &[u64] = &[
            500_000, 1_800_000, 1_850_001, 7_074_000, 14_250_000, 54_000_000, 1_296_000_000,
        ];
        for &hz in test_freqs {
            let text = Hz(hz).encode_wire();
            assert_eq!(Hz::decode_wire(&text), Hz(hz), "round-trip failed for {hz} Hz");
        }
    }

    #[test]
    fn hz_wire_format() {
        assert_eq!(Hz(14_250_000).encode_wire(), "14.250000");
        assert_eq!(Hz::decode_wire("7.074"), Hz(7_074_000));
        assert_eq!(Hz::decode_wire("garbage"), Hz(0));
        assert_eq!(Hz::decode_wire("-1.0"), Hz(0));
    }

    // -- Scalar coercions ---------------------------------------------------

    #[test]
    fn bool_coercion() {
        for t in ["1", "true", "TRUE", "on", "yes"] {
            assert!(parse_bool(t), "{t} should be true");
        }
        for f in ["0", "false", "off", "", "2"] {
            assert!(!parse_bool(f), "{f} should be false");
        }
    }

    #[test]
    fn int_coercion_defaults_to_zero() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("-7"), -7);
        assert_eq!(parse_int("50.000000"), 50);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
    }

    #[test]
    fn narrow_int_out_of_range_defaults() {
        assert_eq!(u8::decode_wire("300"), 0);
        assert_eq!(u16::decode_wire("-1"), 0);
        assert_eq!(i16::decode_wire("-150"), -150);
    }

    #[test]
    fn float_coercion() {
        assert_eq!(parse_float("-135.5"), -135.5);
        assert_eq!(parse_float("nan"), 0.0);
        assert_eq!(parse_float("x"), 0.0);
    }

    #[test]
    fn hex_coercion() {
        assert_eq!(parse_hex("0x40000000"), 0x4000_0000);
        assert_eq!(parse_hex("DEADBEEF"), 0xDEAD_BEEF);
        assert_eq!(parse_hex("nope"), 0);
    }

    #[test]
    fn text_uses_del_for_spaces() {
        assert_eq!(String::decode_wire("My\u{7f}Station"), "My Station");
        assert_eq!("My Station".to_string().encode_wire(), "My\u{7f}Station");
    }

    #[test]
    fn list_values() {
        assert_eq!(
            CommaList::decode_wire("ANT1,ANT2,,RX_A"),
            CommaList(vec!["ANT1".into(), "ANT2".into(), "RX_A".into()])
        );
        assert_eq!(CaretList(vec!["a".into(), "b".into()]).encode_wire(), "a^b");
        assert_eq!(CommaList::decode_wire(""), CommaList::default());
    }

    // -- Tokenizer ----------------------------------------------------------

    #[test]
    fn tokenize_space_separated() {
        let pairs = tokenize("0 RF_frequency=14.250000 mode=USB in_use=1", ' ');
        assert_eq!(
            pairs,
            vec![
                ("0", ""),
                ("RF_frequency", "14.250000"),
                ("mode", "USB"),
                ("in_use", "1"),
            ]
        );
    }

    #[test]
    fn tokenize_hash_separated() {
        let pairs = tokenize("1.src=SLC#1.num=0#1.nam=LEVEL#", '#');
        assert_eq!(
            pairs,
            vec![("1.src", "SLC"), ("1.num", "0"), ("1.nam", "LEVEL")]
        );
    }

    #[test]
    fn tokenize_keeps_value_equals() {
        let pairs = tokenize("name=a=b", ' ');
        assert_eq!(pairs, vec![("name", "a=b")]);
    }

    #[test]
    fn tokenize_collapses_repeated_separators() {
        assert_eq!(tokenize("  a=1   b=2 ", ' '), vec![("a", "1"), ("b", "2")]);
        assert!(tokenize("", ' ').is_empty());
    }

    // -- Control lines ------------------------------------------------------

    #[test]
    fn parse_version_line() {
        assert_eq!(
            parse_line("V1.4.0.0").unwrap(),
            ControlLine::Version("1.4.0.0".into())
        );
    }

    #[test]
    fn parse_handle_line() {
        assert_eq!(
            parse_line("H12345678").unwrap(),
            ControlLine::Handle(ClientHandle::new(0x1234_5678))
        );
        assert!(parse_line("HXYZ").is_err());
    }

    #[test]
    fn parse_reply_success_with_data() {
        assert_eq!(
            parse_line("R7|0|3").unwrap(),
            ControlLine::Reply(Reply {
                sequence: 7,
                result: 0,
                data: "3".into(),
            })
        );
    }

    #[test]
    fn parse_reply_error_code() {
        let ControlLine::Reply(r) = parse_line("R2|50000015|Invalid slice").unwrap() else {
            panic!("expected reply");
        };
        assert_eq!(r.result, 0x5000_0015);
        assert!(!r.is_ok());
    }

    #[test]
    fn parse_reply_without_data() {
        let r = parse_reply("1|00000000").unwrap();
        assert_eq!(r.data, "");
        assert!(r.is_ok());
    }

    #[test]
    fn parse_reply_malformed() {
        assert!(matches!(parse_line("R1"), Err(Error::MalformedLine(_))));
        assert!(matches!(parse_reply("abc|0|"), Err(Error::MalformedLine(_))));
        assert!(matches!(parse_reply("1|ZZ|"), Err(Error::MalformedLine(_))));
    }

    #[test]
    fn parse_status_splits_type_and_body() {
        let line = "S12345678|slice 0 RF_frequency=14.250000 mode=USB";
        let ControlLine::Status(s) = parse_line(line).unwrap() else {
            panic!("expected status");
        };
        assert_eq!(s.handle, ClientHandle::new(0x1234_5678));
        assert_eq!(s.object_type, "slice");
        assert_eq!(s.body, "0 RF_frequency=14.250000 mode=USB");
    }

    #[test]
    fn parse_status_type_only() {
        let ControlLine::Status(s) = parse_line("S0|interlock").unwrap() else {
            panic!("expected status");
        };
        assert_eq!(s.object_type, "interlock");
        assert_eq!(s.body, "");
    }

    #[test]
    fn parse_status_malformed() {
        assert!(matches!(
            parse_line("S12345678 no pipe"),
            Err(Error::MalformedLine(_))
        ));
        assert!(matches!(parse_line("SNOTHEX|slice 0"), Err(Error::MalformedLine(_))));
        assert!(matches!(parse_line("S1|"), Err(Error::MalformedLine(_))));
    }

    #[test]
    fn parse_message_three_fields() {
        let ControlLine::Message(m) = parse_line("M5|03000002|Radio overheating").unwrap() else {
            panic!("expected message");
        };
        assert_eq!(m.sequence, Some(5));
        assert_eq!(m.code, 0x0300_0002);
        assert_eq!(m.severity(), MessageSeverity::Fatal);
        assert_eq!(m.text, "Radio overheating");
    }

    #[test]
    fn parse_message_two_fields() {
        let ControlLine::Message(m) = parse_line("M10000001|Client connected").unwrap() else {
            panic!("expected message");
        };
        assert_eq!(m.sequence, None);
        assert_eq!(m.code, 0x1000_0001);
        assert_eq!(m.severity(), MessageSeverity::Info);
    }

    #[test]
    fn severity_bits() {
        assert_eq!(MessageSeverity::from_code(0x0000_0001), MessageSeverity::Info);
        assert_eq!(MessageSeverity::from_code(0x0100_0000), MessageSeverity::Warning);
        assert_eq!(MessageSeverity::from_code(0x0200_0000), MessageSeverity::Error);
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert_eq!(
            parse_line("X something").unwrap(),
            ControlLine::Unknown("X something".into())
        );
        assert!(matches!(parse_line("   "), Err(Error::MalformedLine(_))));
        assert!(matches!(parse_line("Mnopipe"), Err(Error::MalformedLine(_))));
    }
}
