//! SessionBuilder -- fluent builder for [`Session`]s.
//!
//! Separates configuration from construction so callers can set network
//! parameters and client registration details before the connection is
//! made.
//!
//! # Example
//!
//! ```no_run
//! use flexlib_smartsdr::builder::SessionBuilder;
//!
//! # async fn example() -> flexlib_core::Result<()> {
//! let session = SessionBuilder::new()
//!     .host("192.168.1.100")
//!     .client_name("logger")
//!     .datagrams(true)
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::{TcpStream, UdpSocket};

use flexlib_core::{Error, Result};

use crate::model::DEFAULT_EVENT_CAPACITY;
use crate::session::{
    DEFAULT_CLIENT_NAME, DEFAULT_COMMAND_TIMEOUT, DEFAULT_SUBSCRIPTIONS, HANDSHAKE_TIMEOUT,
    Session, SessionOptions,
};
use crate::transport::WriterTransport;

/// Default SmartSDR TCP command port.
pub const DEFAULT_TCP_PORT: u16 = 4992;

/// Default SmartSDR VITA-49 UDP port.
pub const DEFAULT_UDP_PORT: u16 = 4991;

/// Pre-connected async streams for starting a [`Session`] without a real
/// TCP connection, e.g. the ends of a [`tokio::io::duplex`] pair.
///
/// `tcp_read` is wrapped in a `BufReader` by the builder; pass a raw reader.
pub struct Transports {
    pub tcp_read: Box<dyn AsyncRead + Unpin + Send + 'static>,
    pub tcp_write: Box<dyn AsyncWrite + Unpin + Send + 'static>,
}

/// Fluent builder for [`Session`].
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    host: Option<String>,
    tcp_port: u16,
    udp_port: u16,
    datagrams: bool,
    client_name: String,
    station: Option<String>,
    command_timeout: Duration,
    event_capacity: usize,
    subscriptions: Vec<String>,
    auto_subscribe: bool,
}

impl SessionBuilder {
    pub fn new() -> Self {
        SessionBuilder {
            host: None,
            tcp_port: DEFAULT_TCP_PORT,
            udp_port: DEFAULT_UDP_PORT,
            datagrams: false,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            station: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            subscriptions: DEFAULT_SUBSCRIPTIONS.iter().map(|s| s.to_string()).collect(),
            auto_subscribe: true,
        }
    }

    /// Set the radio's IP address or hostname.
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Set the SmartSDR TCP command port (default: 4992).
    pub fn tcp_port(mut self, port: u16) -> Self {
        self.tcp_port = port;
        self
    }

    /// Set the local VITA-49 UDP port (default: 4991).
    pub fn udp_port(mut self, port: u16) -> Self {
        self.udp_port = port;
        self
    }

    /// Bind the UDP port and start draining datagrams on connect
    /// (default: false).
    pub fn datagrams(mut self, enable: bool) -> Self {
        self.datagrams = enable;
        self
    }

    /// Set the client program name sent during registration (default: "flexlib").
    pub fn client_name(mut self, name: &str) -> Self {
        self.client_name = name.to_string();
        self
    }

    pub fn station(mut self, name: &str) -> Self {
        self.station = Some(name.to_string());
        self
    }

    /// Set the command reply timeout (default: 2s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Replace the default subscription list.
    pub fn subscriptions<I, S>(mut self, subscriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscriptions = subscriptions.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable client registration and subscriptions after
    /// connect (default: true).
    pub fn auto_subscribe(mut self, enable: bool) -> Self {
        self.auto_subscribe = enable;
        self
    }

    /// The session options this builder describes.
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            client_name: self.client_name.clone(),
            station: self.station.clone(),
            command_timeout: self.command_timeout,
            event_capacity: self.event_capacity,
            subscriptions: self.subscriptions.clone(),
            auto_subscribe: self.auto_subscribe,
        }
    }

    /// Connect over TCP and start the session.
    ///
    /// Requires [`host()`](Self::host).
    pub async fn connect(self) -> Result<Session> {
        let host = self.host.as_deref().ok_or_else(|| {
            Error::InvalidParameter("host is required: call .host() before .connect()".into())
        })?;
        if self.event_capacity == 0 {
            return Err(Error::InvalidParameter("event capacity must be non-zero".into()));
        }

        let addr = format!("{host}:{}", self.tcp_port);
        tracing::debug!(addr = %addr, "Connecting to radio");

        let stream = tokio::time::timeout(HANDSHAKE_TIMEOUT, TcpStream::connect(&addr))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| Error::Transport(format!("TCP connect failed: {e}")))?;
        // Disable Nagle for low-latency command/response.
        let _ = stream.set_nodelay(true);

        let (read, write) = stream.into_split();
        let transport = Arc::new(WriterTransport::new(write));
        let session = Session::start(BufReader::new(read), transport, self.options()).await?;

        if self.datagrams {
            let bind_addr = format!("0.0.0.0:{}", self.udp_port);
            let socket = UdpSocket::bind(&bind_addr).await.map_err(|e| {
                Error::Transport(format!("failed to bind UDP socket on {bind_addr}: {e}"))
            })?;
            tracing::debug!(port = self.udp_port, "VITA-49 receiver started");
            session.run_datagrams(socket).await;
        }

        Ok(session)
    }

    /// Start a session over pre-connected streams. No UDP socket is bound;
    /// feed datagrams with [`Session::run_datagrams`] or the dispatcher.
    pub async fn build_with_transports(self, transports: Transports) -> Result<Session> {
        if self.event_capacity == 0 {
            return Err(Error::InvalidParameter("event capacity must be non-zero".into()));
        }
        let reader = BufReader::new(transports.tcp_read);
        let transport = Arc::new(WriterTransport::new(transports.tcp_write));
        Session::start(reader, transport, self.options()).await
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
