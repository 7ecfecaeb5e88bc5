//! Generic identifier-keyed collections of radio objects.
//!
//! [`ObjectCollection`] runs the status algorithm shared by every kind:
//! extract the identifier according to the kind's [`IdRule`], upsert on an
//! in-use line, remove otherwise, then apply the remaining tokens through
//! the kind's property table. [`Singleton`] does the same for kinds that
//! have exactly one instance.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::codec::Pair;
use crate::object::{IdRule, ObjectId, RadioObject, SingleObject};

/// What a status line did to one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<I> {
    pub id: I,
    /// The object was constructed by this line.
    pub added: bool,
    /// At least one property was applied.
    pub updated: bool,
    /// The object became initialized on this line.
    pub initialized: bool,
    /// The object was deleted by this line.
    pub removed: bool,
    /// Tokens that matched no property and were skipped.
    pub unknown_tokens: usize,
}

impl<I> Change<I> {
    fn new(id: I) -> Self {
        Change {
            id,
            added: false,
            updated: false,
            initialized: false,
            removed: false,
            unknown_tokens: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectCollection
// ---------------------------------------------------------------------------

/// All live objects of one kind, keyed by identifier.
///
/// An id present in the map always denotes a fully constructed object
/// (possibly not yet initialized). Removal deletes the entry outright.
#[derive(Debug)]
pub struct ObjectCollection<T: RadioObject> {
    items: HashMap<T::Id, T>,
}

impl<T: RadioObject> Default for ObjectCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RadioObject> ObjectCollection<T> {
    pub fn new() -> Self {
        ObjectCollection {
            items: HashMap::new(),
        }
    }

    /// Insert or replace an object by its identifier. Returns `true` when
    /// the id was not present before.
    pub fn add(&mut self, object: T) -> bool {
        let id = object.id().clone();
        let is_new = self.items.insert(id.clone(), object).is_none();
        if is_new {
            tracing::debug!(kind = %T::KIND, id = %id, "Object added");
        }
        is_new
    }

    pub fn exists(&self, id: &T::Id) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.items.get_mut(id)
    }

    /// First object matching `pred`, in no particular order.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<&T> {
        self.items.values().find(|o| pred(*o))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T::Id, &T)> {
        self.items.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }

    pub fn ids(&self) -> Vec<T::Id> {
        self.items.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Delete one object.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let removed = self.items.remove(id);
        if removed.is_some() {
            tracing::debug!(kind = %T::KIND, id = %id, "Object removed");
        }
        removed
    }

    /// Delete every object matching `pred`, returning their ids.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<T::Id> {
        let ids: Vec<T::Id> = self
            .items
            .iter()
            .filter(|(_, o)| pred(*o))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &ids {
            self.remove(id);
        }
        ids
    }

    /// Delete every object. Returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        let n = self.items.len();
        if n > 0 {
            tracing::debug!(kind = %T::KIND, count = n, "All objects removed");
        }
        self.items.clear();
        n
    }

    /// Apply one status body, already tokenized.
    ///
    /// `in_use` is false when the body carried the kind's removal sentinel.
    /// Most kinds touch one object per line; [`IdRule::Dotted`] kinds may
    /// touch several. A line whose id cannot be extracted is logged and
    /// changes nothing.
    pub fn parse_status(&mut self, pairs: &[Pair<'_>], in_use: bool) -> Vec<Change<T::Id>> {
        match T::ID_RULE {
            IdRule::Dotted => self.parse_dotted(pairs, in_use),
            rule => self.parse_single(rule, pairs, in_use).into_iter().collect(),
        }
    }

    fn parse_single(
        &mut self,
        rule: IdRule,
        pairs: &[Pair<'_>],
        in_use: bool,
    ) -> Option<Change<T::Id>> {
        let id_index = if matches!(rule, IdRule::Second) { 1 } else { 0 };

        let Some((raw_id, _)) = pairs.get(id_index) else {
            tracing::warn!(kind = %T::KIND, "Status line has no identifier");
            return None;
        };

        let (raw_id, prefix) = match rule {
            IdRule::Composite {
                separator,
                prefix_token,
            } => match raw_id.split_once(separator) {
                Some((p, id)) => (id, Some((prefix_token, p))),
                None => (*raw_id, None),
            },
            _ => (*raw_id, None),
        };

        let Some(id) = T::Id::parse_id(raw_id) else {
            tracing::warn!(kind = %T::KIND, token = %raw_id, "Invalid object identifier");
            return None;
        };

        if !in_use {
            let mut change = Change::new(id.clone());
            change.removed = self.remove(&id).is_some();
            return Some(change);
        }

        let mut change = Change::new(id.clone());
        if let Entry::Vacant(slot) = self.items.entry(id.clone()) {
            slot.insert(T::with_id(id.clone()));
            tracing::debug!(kind = %T::KIND, id = %id, "Object added");
            change.added = true;
        }

        if let Some((token, value)) = prefix {
            self.apply(&id, &[(token, value)], &mut change);
        }
        self.apply(&id, &pairs[id_index + 1..], &mut change);
        Some(change)
    }

    fn parse_dotted(&mut self, pairs: &[Pair<'_>], in_use: bool) -> Vec<Change<T::Id>> {
        if !in_use {
            // `5 removed` arrives as a single '#'-delimited token.
            let Some((first, _)) = pairs.first() else {
                return Vec::new();
            };
            let raw = first
                .split(|c: char| c == '.' || c.is_whitespace())
                .next()
                .unwrap_or_default();
            let Some(id) = T::Id::parse_id(raw) else {
                tracing::warn!(kind = %T::KIND, token = %raw, "Invalid object identifier");
                return Vec::new();
            };
            let mut change = Change::new(id.clone());
            change.removed = self.remove(&id).is_some();
            return vec![change];
        }

        // Group by prefix, preserving first-seen order.
        let mut groups: Vec<(T::Id, Vec<Pair<'_>>)> = Vec::new();
        for (key, value) in pairs {
            let Some((raw_id, token)) = key.split_once('.') else {
                tracing::warn!(kind = %T::KIND, token = %key, "Token has no id prefix");
                continue;
            };
            let Some(id) = T::Id::parse_id(raw_id) else {
                tracing::warn!(kind = %T::KIND, token = %key, "Invalid object identifier");
                continue;
            };
            match groups.iter_mut().find(|(g, _)| *g == id) {
                Some((_, group)) => group.push((token, value)),
                None => groups.push((id, vec![(token, value)])),
            }
        }

        groups
            .into_iter()
            .map(|(id, group)| {
                let mut change = Change::new(id.clone());
                if !self.items.contains_key(&id) {
                    self.items.insert(id.clone(), T::with_id(id.clone()));
                    tracing::debug!(kind = %T::KIND, id = %id, "Object added");
                    change.added = true;
                }
                self.apply(&id, &group, &mut change);
                change
            })
            .collect()
    }

    /// Apply `pairs` to an existing object and evaluate its completeness
    /// predicate. Returns `None` if the object does not exist.
    pub fn parse_properties(&mut self, id: &T::Id, pairs: &[Pair<'_>]) -> Option<Change<T::Id>> {
        if !self.items.contains_key(id) {
            return None;
        }
        let mut change = Change::new(id.clone());
        self.apply(id, pairs, &mut change);
        Some(change)
    }

    fn apply(&mut self, id: &T::Id, pairs: &[Pair<'_>], change: &mut Change<T::Id>) {
        let Some(object) = self.items.get_mut(id) else {
            return;
        };

        for (token, value) in pairs {
            if object.apply_property(token, value) {
                change.updated = true;
            } else if value.is_empty() && T::FLAGS.iter().any(|flag| flag == token) {
                // Flag words carry no property.
            } else {
                tracing::warn!(
                    kind = %T::KIND,
                    id = %id,
                    token = %token,
                    "Unknown property token"
                );
                change.unknown_tokens += 1;
            }
        }

        if object.check_initialized() {
            tracing::debug!(kind = %T::KIND, id = %id, "Object initialized");
            change.initialized = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Singleton
// ---------------------------------------------------------------------------

/// The single live instance of a [`SingleObject`] kind.
#[derive(Debug, Default)]
pub struct Singleton<T: SingleObject> {
    inner: T,
}

impl<T: SingleObject> Singleton<T> {
    pub fn get(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Apply a status body. The returned change uses `()` as its id.
    pub fn parse_properties(&mut self, pairs: &[Pair<'_>]) -> Change<()> {
        let mut change = Change::new(());
        for (token, value) in pairs {
            if self.inner.apply_property(token, value) {
                change.updated = true;
            } else {
                tracing::warn!(kind = %T::KIND, token = %token, "Unknown property token");
                change.unknown_tokens += 1;
            }
        }
        if self.inner.check_initialized() {
            tracing::debug!(kind = %T::KIND, "Object initialized");
            change.initialized = true;
        }
        change
    }

    /// Reset to a freshly constructed instance.
    pub fn reset(&mut self) {
        self.inner = T::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
