//! flexlib-test-harness: mock radio and packet builders for flexlib tests.
//!
//! This crate provides [`MockRadio`], the radio end of an in-memory control
//! connection, and the [`packets`] builders for VITA-49 datagrams, so the
//! protocol engine can be tested without a radio on the network.

pub mod mock_radio;
pub mod packets;

pub use mock_radio::{ClientEnds, MockRadio};
