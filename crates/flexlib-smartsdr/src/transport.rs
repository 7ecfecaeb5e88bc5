//! Outbound command channel.
//!
//! The session writes encoded command lines through a [`CommandTransport`]
//! rather than a socket directly, so the same session code drives a real TCP
//! connection, an in-memory duplex pipe, or a test double.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use flexlib_core::{Error, Result};

/// Asynchronous line sink to the radio.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Write one complete, already encoded line (including its `\n`).
    async fn send_line(&self, line: &[u8]) -> Result<()>;

    /// Shut down the write side. Later sends fail with
    /// [`Error::NotConnected`].
    async fn close(&self) -> Result<()>;

    fn is_connected(&self) -> bool;
}

/// [`CommandTransport`] over any async writer, e.g. the write half of a
/// `TcpStream` or a `tokio::io::duplex` end.
pub struct WriterTransport<W> {
    writer: Mutex<Option<W>>,
    connected: AtomicBool,
}

impl<W: AsyncWrite + Unpin + Send> WriterTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(Some(writer)),
            connected: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> CommandTransport for WriterTransport<W> {
    async fn send_line(&self, line: &[u8]) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let w = guard.as_mut().ok_or(Error::NotConnected)?;

        let written = async {
            w.write_all(line).await?;
            w.flush().await
        }
        .await;

        if let Err(e) = written {
            self.connected.store(false, Ordering::SeqCst);
            guard.take();
            return Err(Error::Transport(format!("failed to send command: {e}")));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(mut w) = self.writer.lock().await.take() {
            w.shutdown()
                .await
                .map_err(|e| Error::Transport(format!("failed to close: {e}")))?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn lines_reach_the_peer() {
        let (client, mut radio) = tokio::io::duplex(256);
        let transport = WriterTransport::new(client);

        transport.send_line(b"C1|info\n").await.unwrap();
        transport.send_line(b"C2|version\n").await.unwrap();

        let mut buf = vec![0u8; 64];
        let n = radio.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"C1|info\nC2|version\n");
    }

    #[tokio::test]
    async fn send_after_close_is_not_connected() {
        let (client, _radio) = tokio::io::duplex(64);
        let transport = WriterTransport::new(client);
        assert!(transport.is_connected());

        transport.close().await.unwrap();
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.send_line(b"C1|info\n").await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn broken_pipe_marks_disconnected() {
        let (client, radio) = tokio::io::duplex(64);
        drop(radio);
        let transport = WriterTransport::new(client);

        assert!(matches!(
            transport.send_line(b"C1|info\n").await,
            Err(Error::Transport(_))
        ));
        assert!(!transport.is_connected());
    }
}
