//! Scripted mock radio for control-connection tests.
//!
//! [`MockRadio`] is the radio end of a pair of in-memory duplex pipes. The
//! other end ([`ClientEnds`]) is handed to the code under test as its TCP
//! read and write halves. Tests drive the radio side either interactively
//! (send a status line, wait for a command, reply to it) or by loading
//! expectations and letting a background task answer them in order.
//!
//! # Example
//!
//! ```
//! use flexlib_test_harness::MockRadio;
//!
//! # async fn example() -> flexlib_core::Result<()> {
//! let (mut radio, client) = MockRadio::pair();
//! radio.handshake("1.4.0.0", 0x1234_5678).await?;
//! // ... start a session on `client.read` / `client.write` ...
//! let seq = radio.expect_command("info").await?;
//! radio.reply(seq, 0, r#"model="FLEX-6600""#).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use flexlib_core::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

/// Pipe capacity for each direction.
const PIPE_CAPACITY: usize = 64 * 1024;

/// How long the radio waits for the next command.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// The client's ends of the connection.
pub struct ClientEnds {
    /// Lines from the radio.
    pub read: DuplexStream,
    /// Commands to the radio.
    pub write: DuplexStream,
}

/// A scripted reply to one expected command.
#[derive(Debug, Clone)]
struct Expectation {
    command: String,
    result: u32,
    data: String,
    /// Status lines sent after the reply.
    then: Vec<String>,
}

/// The radio side of a mock control connection.
pub struct MockRadio {
    to_client: DuplexStream,
    from_client: BufReader<DuplexStream>,
    read_timeout: Duration,
    expectations: VecDeque<Expectation>,
}

impl MockRadio {
    /// Create a connected radio/client pair.
    pub fn pair() -> (MockRadio, ClientEnds) {
        let (client_read, to_client) = tokio::io::duplex(PIPE_CAPACITY);
        let (client_write, from_client) = tokio::io::duplex(PIPE_CAPACITY);
        let radio = MockRadio {
            to_client,
            from_client: BufReader::new(from_client),
            read_timeout: DEFAULT_READ_TIMEOUT,
            expectations: VecDeque::new(),
        };
        (
            radio,
            ClientEnds {
                read: client_read,
                write: client_write,
            },
        )
    }

    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    /// Send one raw line (a newline is appended).
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        self.to_client.write_all(line.as_bytes()).await?;
        self.to_client.write_all(b"\n").await?;
        self.to_client.flush().await?;
        Ok(())
    }

    /// Send the `V` and `H` lines that open every connection.
    pub async fn handshake(&mut self, version: &str, handle: u32) -> Result<()> {
        self.send_line(&format!("V{version}")).await?;
        self.send_line(&format!("H{handle:08X}")).await
    }

    /// Send `S<handle>|<body>`.
    pub async fn status(&mut self, handle: u32, body: &str) -> Result<()> {
        self.send_line(&format!("S{handle:08X}|{body}")).await
    }

    /// Send `R<seq>|<result>|<data>`.
    pub async fn reply(&mut self, seq: u32, result: u32, data: &str) -> Result<()> {
        self.send_line(&format!("R{seq}|{result:08X}|{data}")).await
    }

    /// Send `M<code>|<text>`.
    pub async fn message(&mut self, code: u32, text: &str) -> Result<()> {
        self.send_line(&format!("M{code:08X}|{text}")).await
    }

    /// Read the next command line and split it into sequence and text.
    pub async fn next_command(&mut self) -> Result<(u32, String)> {
        let mut line = String::new();
        let n = tokio::time::timeout(self.read_timeout, self.from_client.read_line(&mut line))
            .await
            .map_err(|_| Error::Timeout)??;
        if n == 0 {
            return Err(Error::ConnectionLost);
        }
        parse_command(line.trim_end())
    }

    /// Read the next command and check it is `command`. Returns its
    /// sequence number.
    pub async fn expect_command(&mut self, command: &str) -> Result<u32> {
        let (seq, got) = self.next_command().await?;
        if got != command {
            return Err(Error::Protocol(format!(
                "expected command {command:?}, got {got:?}"
            )));
        }
        Ok(seq)
    }

    /// Queue a reply for the next expected command, in order.
    pub fn expect(&mut self, command: &str, result: u32, data: &str) -> &mut Self {
        self.expectations.push_back(Expectation {
            command: command.to_string(),
            result,
            data: data.to_string(),
            then: Vec::new(),
        });
        self
    }

    /// Status lines to send right after the most recently queued reply.
    pub fn then_status(&mut self, lines: &[&str]) -> &mut Self {
        if let Some(last) = self.expectations.back_mut() {
            last.then.extend(lines.iter().map(|l| l.to_string()));
        }
        self
    }

    /// Answer every queued expectation in a background task. The task
    /// returns the radio when the script is done so the test can continue
    /// interactively.
    pub fn start(mut self) -> JoinHandle<Result<MockRadio>> {
        tokio::spawn(async move {
            while let Some(step) = self.expectations.pop_front() {
                let seq = self.expect_command(&step.command).await?;
                self.reply(seq, step.result, &step.data).await?;
                for line in &step.then {
                    self.send_line(line).await?;
                }
            }
            Ok(self)
        })
    }

    /// Close the radio side. The client sees end of stream.
    pub async fn close(mut self) -> Result<()> {
        self.to_client.shutdown().await?;
        Ok(())
    }
}

fn parse_command(line: &str) -> Result<(u32, String)> {
    let body = line
        .strip_prefix('C')
        .ok_or_else(|| Error::Protocol(format!("not a command line: {line}")))?;
    // `CD` marks a command that wants no reply; its sequence follows the D.
    let body = body.strip_prefix('D').unwrap_or(body);
    let (seq, command) = body
        .split_once('|')
        .ok_or_else(|| Error::MalformedLine(format!("command has no pipe: {line}")))?;
    let seq = seq
        .parse::<u32>()
        .map_err(|_| Error::MalformedLine(format!("invalid command sequence: {line}")))?;
    tracing::trace!(seq, command = %command, "Mock radio received command");
    Ok((seq, command.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
