//! Model change notifications.
//!
//! The object store publishes a [`ModelEvent`] through a bounded
//! [`tokio::sync::broadcast`] channel after each status line it applies.
//! Panadapter displays and other observers subscribe to these instead of
//! polling the store.

use crate::types::{ClientHandle, ObjectKind};

/// An event emitted by the object store when its contents change.
///
/// Events are delivered on a best-effort basis; a lagging subscriber misses
/// events but never blocks the control-line path. Identifiers are carried in
/// their textual form so one event type can describe every object kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// A new object was constructed from an "in use" status line.
    Added {
        /// Kind of the new object.
        kind: ObjectKind,
        /// Identifier of the new object (empty for single-instance kinds).
        id: String,
    },

    /// An object's completeness predicate held for the first time.
    Initialized {
        kind: ObjectKind,
        id: String,
    },

    /// One or more properties of an existing object changed.
    Updated {
        kind: ObjectKind,
        id: String,
    },

    /// An object was deleted by a removal status line or a cascade.
    Removed {
        kind: ObjectKind,
        id: String,
    },

    /// The radio assigned this connection its client handle.
    HandleAssigned {
        handle: ClientHandle,
    },

    /// The radio announced its protocol/hardware version.
    Version {
        version: String,
    },

    /// Every collection was cleared (connection closed).
    Cleared,
}

impl ModelEvent {
    /// The object kind this event concerns, if any.
    pub fn kind(&self) -> Option<ObjectKind> {
        match self {
            ModelEvent::Added { kind, .. }
            | ModelEvent::Initialized { kind, .. }
            | ModelEvent::Updated { kind, .. }
            | ModelEvent::Removed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
