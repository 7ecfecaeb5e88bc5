//! SmartSDR protocol engine for FlexRadio software-defined radios.
//!
//! This crate keeps a live, thread-safe model of a FLEX-6000/8000 radio's
//! state from the two streams the radio emits:
//!
//! - **Control lines** over TCP: version, handle, replies, status and
//!   messages. The [`router`] tokenizes each `S` line and applies it to the
//!   matching object collection in the [`Model`]; the [`reply`] correlator
//!   matches `R` lines to the commands that produced them.
//! - **VITA-49 datagrams** over UDP: meter readings, panadapter and
//!   waterfall segments, DAX audio, DAX IQ and remote audio. The
//!   [`DataDispatcher`] routes each packet to its stream object, which
//!   reassembles or sequence-checks it and hands finished frames to a
//!   registered [`StreamDelegate`](stream::StreamDelegate).
//!
//! [`Session`] ties the two together over a concrete connection; the model,
//! router and dispatcher can also be driven directly.
//!
//! # Example
//!
//! ```no_run
//! use flexlib_smartsdr::SessionBuilder;
//!
//! # async fn example() -> flexlib_core::Result<()> {
//! let session = SessionBuilder::new().host("192.168.1.100").connect().await?;
//! session.request_radio_info().await?;
//! let slices = session.model().slices.read(|s| s.len());
//! println!("{slices} slices in use");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod codec;
pub mod collection;
pub mod command;
pub mod model;
pub mod object;
pub mod objects;
pub mod reply;
pub mod router;
pub mod session;
pub mod stream;
pub mod transport;
pub mod vita49;

pub use builder::{DEFAULT_TCP_PORT, DEFAULT_UDP_PORT, SessionBuilder, Transports};
pub use codec::Hz;
pub use collection::{Change, ObjectCollection, Singleton};
pub use command::CommandValue;
pub use model::{Guarded, Model};
pub use object::{IdRule, RadioObject, SingleObject};
pub use reply::{ReplyCallback, ReplyCorrelator};
pub use router::route_line;
pub use session::{Session, SessionOptions};
pub use stream::{DataDispatcher, StreamDelegate};
pub use transport::{CommandTransport, WriterTransport};
