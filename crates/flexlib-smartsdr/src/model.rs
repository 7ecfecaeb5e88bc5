//! The concurrent object store.
//!
//! [`Model`] owns every collection, every single-instance object and the
//! pending-reply table for one connection. It is shared as `Arc<Model>`
//! between the control-line task, the datagram task and application code.
//!
//! Each collection sits behind its own [`std::sync::RwLock`]: reads run
//! concurrently, a write locks only the collection it touches, and nothing
//! is ever held across an `.await`. Updating a slice and then its
//! panadapter is two independent critical sections.
//!
//! After each applied status line the store publishes [`ModelEvent`]s on a
//! bounded broadcast channel. A slow subscriber lags and misses events; it
//! never blocks the control path.

use std::fmt;
use std::sync::RwLock;

use tokio::sync::broadcast;

use flexlib_core::{ClientHandle, ModelEvent, ObjectKind, StreamId};

use crate::codec::Pair;
use crate::collection::{Change, ObjectCollection, Singleton};
use crate::object::{RadioObject, SingleObject};
use crate::objects::{
    Amplifier, Atu, BandSetting, DaxIqStream, DaxMicAudioStream, DaxRxAudioStream,
    DaxTxAudioStream, Equalizer, Gps, GuiClient, Interlock, Memory, Meter, Panadapter, Profile,
    Radio, RemoteRxAudioStream, RemoteTxAudioStream, Slice, Tnf, Transmit, UsbCable, Wan, Waterfall,
    Waveform, Xvtr,
};
use crate::reply::ReplyCorrelator;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Guarded
// ---------------------------------------------------------------------------

/// A value behind a reader/writer lock, accessed through closures so a
/// guard can never escape into async code.
///
/// A poisoned lock is recovered rather than propagated: the protected data
/// is only ever mutated by parsers that cannot leave it half-written.
#[derive(Debug, Default)]
pub struct Guarded<T> {
    inner: RwLock<T>,
}

impl<T> Guarded<T> {
    pub fn new(value: T) -> Self {
        Guarded {
            inner: RwLock::new(value),
        }
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Run `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Every object the radio has described on this connection.
pub struct Model {
    pub slices: Guarded<ObjectCollection<Slice>>,
    pub panadapters: Guarded<ObjectCollection<Panadapter>>,
    pub waterfalls: Guarded<ObjectCollection<Waterfall>>,
    pub meters: Guarded<ObjectCollection<Meter>>,
    pub tnfs: Guarded<ObjectCollection<Tnf>>,
    pub memories: Guarded<ObjectCollection<Memory>>,
    pub equalizers: Guarded<ObjectCollection<Equalizer>>,
    pub amplifiers: Guarded<ObjectCollection<Amplifier>>,
    pub band_settings: Guarded<ObjectCollection<BandSetting>>,
    pub xvtrs: Guarded<ObjectCollection<Xvtr>>,
    pub usb_cables: Guarded<ObjectCollection<UsbCable>>,
    pub profiles: Guarded<ObjectCollection<Profile>>,
    pub gui_clients: Guarded<ObjectCollection<GuiClient>>,

    pub dax_rx_streams: Guarded<ObjectCollection<DaxRxAudioStream>>,
    pub dax_tx_streams: Guarded<ObjectCollection<DaxTxAudioStream>>,
    pub dax_mic_streams: Guarded<ObjectCollection<DaxMicAudioStream>>,
    pub dax_iq_streams: Guarded<ObjectCollection<DaxIqStream>>,
    pub remote_rx_streams: Guarded<ObjectCollection<RemoteRxAudioStream>>,
    pub remote_tx_streams: Guarded<ObjectCollection<RemoteTxAudioStream>>,

    pub radio: Guarded<Singleton<Radio>>,
    pub atu: Guarded<Singleton<Atu>>,
    pub gps: Guarded<Singleton<Gps>>,
    pub interlock: Guarded<Singleton<Interlock>>,
    pub transmit: Guarded<Singleton<Transmit>>,
    pub wan: Guarded<Singleton<Wan>>,
    pub waveform: Guarded<Singleton<Waveform>>,

    replies: ReplyCorrelator,
    handle: Guarded<ClientHandle>,
    version: Guarded<String>,
    events: broadcast::Sender<ModelEvent>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("handle", &self.handle())
            .field("version", &self.version())
            .field("slices", &self.slices.read(|c| c.len()))
            .field("panadapters", &self.panadapters.read(|c| c.len()))
            .field("meters", &self.meters.read(|c| c.len()))
            .field("pending_replies", &self.replies.pending())
            .finish_non_exhaustive()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl Model {
    /// Create an empty store whose event channel holds `event_capacity`
    /// events per subscriber.
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Model {
            slices: Guarded::default(),
            panadapters: Guarded::default(),
            waterfalls: Guarded::default(),
            meters: Guarded::default(),
            tnfs: Guarded::default(),
            memories: Guarded::default(),
            equalizers: Guarded::default(),
            amplifiers: Guarded::default(),
            band_settings: Guarded::default(),
            xvtrs: Guarded::default(),
            usb_cables: Guarded::default(),
            profiles: Guarded::default(),
            gui_clients: Guarded::default(),
            dax_rx_streams: Guarded::default(),
            dax_tx_streams: Guarded::default(),
            dax_mic_streams: Guarded::default(),
            dax_iq_streams: Guarded::default(),
            remote_rx_streams: Guarded::default(),
            remote_tx_streams: Guarded::default(),
            radio: Guarded::default(),
            atu: Guarded::default(),
            gps: Guarded::default(),
            interlock: Guarded::default(),
            transmit: Guarded::default(),
            wan: Guarded::default(),
            waveform: Guarded::default(),
            replies: ReplyCorrelator::new(),
            handle: Guarded::new(ClientHandle::NONE),
            version: Guarded::default(),
            events,
        }
    }

    /// Receive change events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.events.subscribe()
    }

    /// The pending-reply table.
    pub fn replies(&self) -> &ReplyCorrelator {
        &self.replies
    }

    /// This connection's client handle, [`ClientHandle::NONE`] until the
    /// radio assigns one.
    pub fn handle(&self) -> ClientHandle {
        self.handle.read(|h| *h)
    }

    pub fn set_handle(&self, handle: ClientHandle) {
        self.handle.write(|h| *h = handle);
        tracing::debug!(handle = %handle, "Client handle assigned");
        self.emit(ModelEvent::HandleAssigned { handle });
    }

    /// The protocol version announced by the radio.
    pub fn version(&self) -> String {
        self.version.read(|v| v.clone())
    }

    pub fn set_version(&self, version: &str) {
        self.version.write(|v| *v = version.to_string());
        tracing::debug!(version = %version, "Radio version");
        self.emit(ModelEvent::Version {
            version: version.to_string(),
        });
    }

    pub(crate) fn emit(&self, event: ModelEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Publish the events described by a batch of changes.
    pub fn publish<I: fmt::Display>(&self, kind: ObjectKind, changes: &[Change<I>]) {
        for change in changes {
            self.publish_one(kind, change.id.to_string(), change);
        }
    }

    fn publish_one<I>(&self, kind: ObjectKind, id: String, change: &Change<I>) {
        if change.added {
            self.emit(ModelEvent::Added {
                kind,
                id: id.clone(),
            });
        }
        if change.initialized {
            self.emit(ModelEvent::Initialized {
                kind,
                id: id.clone(),
            });
        }
        if change.updated && !change.added {
            self.emit(ModelEvent::Updated {
                kind,
                id: id.clone(),
            });
        }
        if change.removed {
            self.emit(ModelEvent::Removed { kind, id });
        }
    }

    // -----------------------------------------------------------------------
    // Generic operations
    // -----------------------------------------------------------------------

    /// Apply a tokenized status body to a collection and publish the result.
    pub fn apply_status<T: RadioObject>(
        &self,
        collection: &Guarded<ObjectCollection<T>>,
        pairs: &[Pair<'_>],
        in_use: bool,
    ) -> Vec<Change<T::Id>> {
        let changes = collection.write(|c| c.parse_status(pairs, in_use));
        self.publish(T::KIND, &changes);
        changes
    }

    /// Apply a tokenized status body to a single-instance object.
    pub fn apply_single<T: SingleObject>(
        &self,
        single: &Guarded<Singleton<T>>,
        pairs: &[Pair<'_>],
    ) -> Change<()> {
        let change = single.write(|s| s.parse_properties(pairs));
        self.publish_one(T::KIND, String::new(), &change);
        change
    }

    /// Insert or replace an object, publishing `Added` for a new id and
    /// `Updated` for a replaced one. Returns whether the id was new.
    pub fn add<T: RadioObject>(&self, collection: &Guarded<ObjectCollection<T>>, object: T) -> bool {
        let id = object.id().to_string();
        let is_new = collection.write(|c| c.add(object));
        let kind = T::KIND;
        if is_new {
            self.emit(ModelEvent::Added { kind, id });
        } else {
            self.emit(ModelEvent::Updated { kind, id });
        }
        is_new
    }

    /// Remove one object by id, publishing the removal. Returns whether it
    /// existed.
    pub fn remove<T: RadioObject>(&self, collection: &Guarded<ObjectCollection<T>>, id: &T::Id) -> bool {
        let removed = collection.write(|c| c.remove(id).is_some());
        if removed {
            self.emit(ModelEvent::Removed {
                kind: T::KIND,
                id: id.to_string(),
            });
        }
        removed
    }

    fn remove_matching<T: RadioObject>(
        &self,
        collection: &Guarded<ObjectCollection<T>>,
        pred: impl FnMut(&T) -> bool,
    ) -> Vec<T::Id> {
        let ids = collection.write(|c| c.remove_where(pred));
        for id in &ids {
            self.emit(ModelEvent::Removed {
                kind: T::KIND,
                id: id.to_string(),
            });
        }
        ids
    }

    // -----------------------------------------------------------------------
    // Cascades
    // -----------------------------------------------------------------------

    /// Remove the meters sourced from slice `slice`.
    pub fn remove_slice_meters(&self, slice: u16) -> Vec<u16> {
        let ids = self.remove_matching(&self.meters, |m| m.belongs_to_slice(slice));
        if !ids.is_empty() {
            tracing::debug!(slice, count = ids.len(), "Removed slice meters");
        }
        ids
    }

    /// Remove the waterfalls attached to panadapter `pan`.
    pub fn remove_panadapter_waterfalls(&self, pan: StreamId) -> Vec<StreamId> {
        let ids = self.remove_matching(&self.waterfalls, |w| w.panadapter == pan);
        if !ids.is_empty() {
            tracing::debug!(
                panadapter = %pan,
                count = ids.len(),
                "Removed panadapter waterfalls"
            );
        }
        ids
    }

    /// Remove a slice and everything sourced from it.
    pub fn remove_slice(&self, id: u16) -> bool {
        let removed = self.remove(&self.slices, &id);
        if removed {
            self.remove_slice_meters(id);
        }
        removed
    }

    /// Remove a panadapter and its waterfall.
    pub fn remove_panadapter(&self, id: StreamId) -> bool {
        let removed = self.remove(&self.panadapters, &id);
        if removed {
            self.remove_panadapter_waterfalls(id);
        }
        removed
    }

    /// Remove `id` from whichever stream collection holds it. Returns the
    /// kind it was found in.
    pub fn remove_stream(&self, id: StreamId) -> Option<ObjectKind> {
        if self.remove(&self.dax_rx_streams, &id) {
            Some(ObjectKind::DaxRxAudioStream)
        } else if self.remove(&self.dax_tx_streams, &id) {
            Some(ObjectKind::DaxTxAudioStream)
        } else if self.remove(&self.dax_mic_streams, &id) {
            Some(ObjectKind::DaxMicAudioStream)
        } else if self.remove(&self.dax_iq_streams, &id) {
            Some(ObjectKind::DaxIqStream)
        } else if self.remove(&self.remote_rx_streams, &id) {
            Some(ObjectKind::RemoteRxAudioStream)
        } else if self.remove(&self.remote_tx_streams, &id) {
            Some(ObjectKind::RemoteTxAudioStream)
        } else {
            None
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Clear every collection, reset every single-instance object and drop
    /// pending replies. Called when the connection closes.
    pub fn remove_all(&self) {
        let mut removed = 0;
        removed += self.slices.write(|c| c.remove_all());
        removed += self.panadapters.write(|c| c.remove_all());
        removed += self.waterfalls.write(|c| c.remove_all());
        removed += self.meters.write(|c| c.remove_all());
        removed += self.tnfs.write(|c| c.remove_all());
        removed += self.memories.write(|c| c.remove_all());
        removed += self.equalizers.write(|c| c.remove_all());
        removed += self.amplifiers.write(|c| c.remove_all());
        removed += self.band_settings.write(|c| c.remove_all());
        removed += self.xvtrs.write(|c| c.remove_all());
        removed += self.usb_cables.write(|c| c.remove_all());
        removed += self.profiles.write(|c| c.remove_all());
        removed += self.gui_clients.write(|c| c.remove_all());
        removed += self.dax_rx_streams.write(|c| c.remove_all());
        removed += self.dax_tx_streams.write(|c| c.remove_all());
        removed += self.dax_mic_streams.write(|c| c.remove_all());
        removed += self.dax_iq_streams.write(|c| c.remove_all());
        removed += self.remote_rx_streams.write(|c| c.remove_all());
        removed += self.remote_tx_streams.write(|c| c.remove_all());

        self.radio.write(|s| s.reset());
        self.atu.write(|s| s.reset());
        self.gps.write(|s| s.reset());
        self.interlock.write(|s| s.reset());
        self.transmit.write(|s| s.reset());
        self.wan.write(|s| s.reset());
        self.waveform.write(|s| s.reset());

        let abandoned = self.replies.clear();
        self.handle.write(|h| *h = ClientHandle::NONE);

        tracing::debug!(removed, abandoned, "Model cleared");
        self.emit(ModelEvent::Cleared);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
