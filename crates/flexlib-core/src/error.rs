//! Error types for flexlib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Note that most protocol problems never
//! surface as an `Error` to the application: the status router and the
//! stream processors log them and drop the offending line or packet. The
//! variants below are what the pure parsers report to those callers, and
//! what the session layer reports to command issuers.

/// The error type for all flexlib operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (TCP socket, UDP socket).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (bad version line, unparsable handle).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A control line is missing a required delimiter or field.
    #[error("malformed line: {0}")]
    MalformedLine(String),

    /// A status line names an object type the router does not know.
    #[error("unknown status type: {0}")]
    UnknownStatus(String),

    /// A binary frame failed validation (short payload, bad bin counts).
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The radio answered a command with a non-zero result code.
    #[error("command failed with 0x{code:08X}: {message}")]
    Command {
        /// The hex result code from the reply line.
        code: u32,
        /// Decoded description of the code, or the reply text.
        message: String,
    },

    /// Timed out waiting for a reply from the radio.
    #[error("timeout waiting for response")]
    Timeout,

    /// No connection to the radio has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the radio was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// A configuration value is missing or out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A frame delegate or command channel was closed.
    #[error("stream closed")]
    StreamClosed,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_protocol() {
        let e = Error::Protocol("bad version".into());
        assert_eq!(e.to_string(), "protocol error: bad version");
    }

    #[test]
    fn error_display_malformed_line() {
        let e = Error::MalformedLine("S123 no pipe".into());
        assert_eq!(e.to_string(), "malformed line: S123 no pipe");
    }

    #[test]
    fn error_display_command() {
        let e = Error::Command {
            code: 0x5000_0015,
            message: "unknown command".into(),
        };
        assert_eq!(
            e.to_string(),
            "command failed with 0x50000015: unknown command"
        );
    }

    #[test]
    fn error_display_invalid_frame() {
        let e = Error::InvalidFrame("segment exceeds frame".into());
        assert_eq!(e.to_string(), "invalid frame: segment exceeds frame");
    }

    #[test]
    fn error_display_unit_variants() {
        assert_eq!(Error::Timeout.to_string(), "timeout waiting for response");
        assert_eq!(Error::NotConnected.to_string(), "not connected");
        assert_eq!(Error::ConnectionLost.to_string(), "connection lost");
        assert_eq!(Error::StreamClosed.to_string(), "stream closed");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
