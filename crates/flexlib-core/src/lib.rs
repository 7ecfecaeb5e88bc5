//! flexlib-core: shared types and error definitions for flexlib.
//!
//! This crate holds the pieces every other flexlib crate agrees on, so an
//! application can name errors, identifiers and model events without pulling
//! in the protocol engine.
//!
//! # Key types
//!
//! - [`Error`] / [`Result`] -- error handling
//! - [`ModelEvent`] -- object store change notifications
//! - [`StreamId`] / [`ClientHandle`] -- hex identifiers used on the wire
//! - [`ObjectKind`] / [`StreamKind`] -- classification of radio objects

pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use events::ModelEvent;
pub use types::*;
