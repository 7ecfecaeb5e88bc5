//! # flexlib -- SmartSDR client library for FlexRadio
//!
//! `flexlib` keeps a live model of a FlexRadio FLEX-6000/8000 radio from
//! its SmartSDR control connection and VITA-49 data stream.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flexlib::{ModelEvent, SessionBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = SessionBuilder::new()
//!         .host("192.168.1.100")
//!         .datagrams(true)
//!         .connect()
//!         .await?;
//!
//!     let mut events = session.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         if let ModelEvent::Initialized { kind, id } = event {
//!             println!("{kind} {id} ready");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                  | Purpose                                              |
//! |------------------------|------------------------------------------------------|
//! | `flexlib-core`         | Errors, model events, identifiers, object kinds      |
//! | `flexlib-smartsdr`     | Router, object store, reply correlation, VITA-49 streams, session |
//! | `flexlib-test-harness` | Mock radio and packet builders for tests             |
//! | **`flexlib`**          | This facade crate -- re-exports everything           |
//!
//! Status lines are applied to the [`Model`], one lock per collection.
//! Every add, first-time initialization, update and removal is published as
//! a [`ModelEvent`] on a broadcast channel. Binary stream frames are handed
//! to per-object [`StreamDelegate`]s, such as a bounded
//! `tokio::sync::mpsc::Sender`.

pub use flexlib_core::*;
pub use flexlib_smartsdr::{
    CommandTransport, CommandValue, DataDispatcher, Hz, Model, Session, SessionBuilder,
    SessionOptions, StreamDelegate, Transports, WriterTransport, route_line,
};

/// Object types for every status-line kind.
pub mod objects {
    pub use flexlib_smartsdr::objects::*;
}

/// Binary stream frames, delegates and the frame reassembler.
pub mod stream {
    pub use flexlib_smartsdr::stream::*;
}

/// Command string builders.
pub mod command {
    pub use flexlib_smartsdr::command::*;
}

/// The protocol engine, for callers that drive the router, store and
/// dispatcher directly.
pub mod smartsdr {
    pub use flexlib_smartsdr::*;
}
