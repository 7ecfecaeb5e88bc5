//! Session glue: one connection to one radio.
//!
//! [`Session`] owns the [`Model`], the outbound [`CommandTransport`] and the
//! background tasks that feed the model. The control task reads lines from
//! the TCP side and hands each to the status router; the optional datagram
//! task drains the UDP side into a [`DataDispatcher`]. Commands are framed
//! as `C<seq>|<command>` with a session-wide sequence counter starting at 1,
//! and their replies are correlated through the model's reply table.
//!
//! When the control side closes, or [`Session::disconnect`] is called, every
//! collection is cleared and pending commands fail with
//! [`Error::ConnectionLost`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use flexlib_core::{Error, ModelEvent, Result, StreamId, StreamKind};

use crate::codec::Reply;
use crate::command::{self, encode_command};
use crate::model::{DEFAULT_EVENT_CAPACITY, Model};
use crate::reply::{ReplyCallback, describe_error};
use crate::router::route_line;
use crate::stream::DataDispatcher;
use crate::transport::CommandTransport;

/// Default command timeout (2 seconds).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait for the version and handle lines after connecting.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default client program name.
pub const DEFAULT_CLIENT_NAME: &str = "flexlib";

/// Status subscriptions requested after connect.
pub const DEFAULT_SUBSCRIPTIONS: &[&str] = &[
    "client all",
    "radio all",
    "tx all",
    "atu all",
    "amplifier all",
    "gps all",
    "meter all",
    "pan all",
    "slice all",
    "tnf all",
    "memories all",
    "xvtr all",
    "usb_cable all",
    "profile all",
    "stream all",
];

/// Options for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Program name sent with `client program`.
    pub client_name: String,
    /// Station name sent with `client station`, if any.
    pub station: Option<String>,
    /// How long [`Session::send_command`] waits for a reply.
    pub command_timeout: Duration,
    /// Capacity of the model event channel.
    pub event_capacity: usize,
    /// Objects to subscribe to after connect.
    pub subscriptions: Vec<String>,
    /// Register the client and send the subscriptions after connect.
    pub auto_subscribe: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            station: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            subscriptions: DEFAULT_SUBSCRIPTIONS.iter().map(|s| s.to_string()).collect(),
            auto_subscribe: true,
        }
    }
}

/// A live connection to a radio.
pub struct Session {
    model: Arc<Model>,
    transport: Arc<dyn CommandTransport>,
    dispatcher: Arc<DataDispatcher>,

    /// Next command sequence number (starts at 1).
    next_seq: AtomicU32,
    command_timeout: Duration,

    /// Cleared by the control task when the radio closes the connection.
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    control_task: Mutex<Option<JoinHandle<()>>>,
    datagram_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.model.handle())
            .field("connected", &self.is_connected())
            .field("next_seq", &self.next_seq.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session over an already connected control stream.
    ///
    /// Reads lines until the radio has assigned a client handle, then spawns
    /// the control task. With `auto_subscribe`, registers the client and
    /// sends the subscriptions.
    pub async fn start<R>(
        mut reader: R,
        transport: Arc<dyn CommandTransport>,
        options: SessionOptions,
    ) -> Result<Self>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let model = Arc::new(Model::new(options.event_capacity));

        tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake(&mut reader, &model))
            .await
            .map_err(|_| Error::Timeout)??;
        tracing::debug!(
            handle = %model.handle(),
            version = %model.version(),
            "Session handshake complete"
        );

        let connected = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();

        let control_task = {
            let model = Arc::clone(&model);
            let connected = Arc::clone(&connected);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                control_loop(reader, &model, cancel).await;
                connected.store(false, Ordering::SeqCst);
                model.remove_all();
            })
        };

        let session = Session {
            dispatcher: Arc::new(DataDispatcher::new(Arc::clone(&model))),
            model,
            transport,
            next_seq: AtomicU32::new(1),
            command_timeout: options.command_timeout,
            connected,
            cancel,
            control_task: Mutex::new(Some(control_task)),
            datagram_task: Mutex::new(None),
        };

        if options.auto_subscribe {
            session
                .send(&command::cmd_client_program(&options.client_name))
                .await?;
            if let Some(station) = &options.station {
                session.send(&command::cmd_client_station(station)).await?;
            }
            for sub in &options.subscriptions {
                session.send(&command::cmd_subscribe(sub)).await?;
            }
        }

        Ok(session)
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Subscribe to model change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.model.subscribe()
    }

    pub fn dispatcher(&self) -> &Arc<DataDispatcher> {
        &self.dispatcher
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.transport.is_connected()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Send a command without waiting. Its reply, when it arrives, still
    /// feeds the reply parsers. Returns the sequence number used.
    pub async fn send(&self, command: &str) -> Result<u32> {
        self.send_with_reply(command, None).await
    }

    /// Send a command and register `callback` to run once with its reply.
    pub async fn send_with_reply(
        &self,
        command: &str,
        callback: Option<ReplyCallback>,
    ) -> Result<u32> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        // Registered before writing so a fast reply cannot miss its entry.
        self.model.replies().add_reply_handler(seq, command, callback);

        tracing::trace!(seq, command = %command, "Sending command");
        if let Err(e) = self.transport.send_line(&encode_command(seq, command)).await {
            self.model.replies().remove(seq);
            return Err(e);
        }
        Ok(seq)
    }

    /// Send a command and await its reply data.
    ///
    /// A non-zero result code becomes [`Error::Command`]. On timeout the
    /// pending entry is dropped so a late reply is ignored.
    pub async fn send_command(&self, command: &str) -> Result<String> {
        let (tx, rx) = oneshot::channel::<Reply>();
        let callback: ReplyCallback = Box::new(move |reply: &Reply| {
            // The waiter may have timed out.
            let _ = tx.send(reply.clone());
        });
        let seq = self.send_with_reply(command, Some(callback)).await?;

        match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(reply)) if reply.is_ok() => Ok(reply.data),
            Ok(Ok(reply)) => {
                let message = if reply.data.is_empty() {
                    describe_error(reply.result).to_string()
                } else {
                    reply.data
                };
                Err(Error::Command {
                    code: reply.result,
                    message,
                })
            }
            // Callback dropped unanswered: the reply table was cleared.
            Ok(Err(_)) => Err(Error::ConnectionLost),
            Err(_) => {
                self.model.replies().remove(seq);
                tracing::debug!(seq, command = %command, "Command timed out");
                Err(Error::Timeout)
            }
        }
    }

    /// Ask for the radio's identity and list data: `info`, `version`,
    /// `slice list`, `ant list`, `mic list`. The replies populate the radio
    /// object as they arrive.
    pub async fn request_radio_info(&self) -> Result<()> {
        for cmd in [
            command::cmd_info(),
            command::cmd_version(),
            command::cmd_slice_list(),
            command::cmd_ant_list(),
            command::cmd_mic_list(),
        ] {
            self.send(&cmd).await?;
        }
        Ok(())
    }

    /// Request a new stream and return the id the radio assigned.
    pub async fn create_stream(&self, kind: StreamKind, channel: Option<u8>) -> Result<StreamId> {
        let data = self
            .send_command(&command::cmd_stream_create(kind, channel))
            .await?;
        StreamId::from_hex(data.trim())
            .ok_or_else(|| Error::Protocol(format!("invalid stream id in reply: {data}")))
    }

    /// Ask the radio to remove a stream. The object itself goes away when
    /// the radio's removal status arrives.
    pub async fn remove_stream(&self, id: StreamId) -> Result<()> {
        self.send_command(&command::cmd_stream_remove(id))
            .await
            .map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Datagrams
    // -----------------------------------------------------------------------

    /// Start draining `socket` into the model. Replaces any previous
    /// datagram task.
    pub async fn run_datagrams(&self, socket: UdpSocket) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let cancel = self.cancel.child_token();
        let task = tokio::spawn(async move { dispatcher.run(socket, cancel).await });

        if let Some(previous) = self.datagram_task.lock().await.replace(task) {
            previous.abort();
        }
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// Stop the background tasks, close the transport and clear the model.
    pub async fn disconnect(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Ok(());
        }
        tracing::debug!("Disconnecting session");
        self.connected.store(false, Ordering::SeqCst);
        self.cancel.cancel();

        if let Err(e) = self.transport.close().await {
            tracing::debug!(error = %e, "Transport close failed");
        }

        for slot in [&self.control_task, &self.datagram_task] {
            if let Some(task) = slot.lock().await.take() {
                if let Err(e) = task.await {
                    tracing::debug!(error = %e, "Background task ended abnormally");
                }
            }
        }

        // The control task clears the model on exit; this covers a session
        // whose control task had already finished.
        self.model.remove_all();
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Control side
// ---------------------------------------------------------------------------

/// Read one line, lossily decoded. `None` at end of stream.
async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>> {
    buf.clear();
    let n = reader.read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Route lines until the radio has assigned a client handle.
async fn handshake<R: AsyncBufRead + Unpin>(reader: &mut R, model: &Model) -> Result<()> {
    let mut buf = Vec::new();
    while model.handle().is_none() {
        match read_line(reader, &mut buf).await? {
            Some(line) if !line.is_empty() => route_line(model, &line),
            Some(_) => {}
            None => return Err(Error::ConnectionLost),
        }
    }
    Ok(())
}

async fn control_loop<R: AsyncBufRead + Unpin>(mut reader: R, model: &Model, cancel: CancellationToken) {
    let mut buf = Vec::new();
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Control loop stopped");
                return;
            }
            next = read_line(&mut reader, &mut buf) => next,
        };

        match next {
            Ok(Some(line)) if line.is_empty() => {}
            Ok(Some(line)) => route_line(model, &line),
            Ok(None) => {
                tracing::debug!("Control connection closed by radio");
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Control connection read error");
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
