//! The per-kind contract shared by every radio object.
//!
//! Every object kind differs only in its field set, its token table, the
//! position of its identifier in a status body and its completeness
//! predicate. Those four things are expressed here as traits plus the
//! [`property_table!`](crate::property_table) macro, so a single generic
//! [`ObjectCollection`](crate::collection::ObjectCollection) drives all of
//! them.

use std::fmt;
use std::hash::Hash;

use flexlib_core::{ClientHandle, ObjectKind, StreamId};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// An object identifier parsed from a status token.
pub trait ObjectId: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Parse the identifier token. `None` when the token is not a valid id
    /// for this kind.
    fn parse_id(token: &str) -> Option<Self>;
}

impl ObjectId for u16 {
    fn parse_id(token: &str) -> Option<Self> {
        token.trim().parse().ok()
    }
}

impl ObjectId for u32 {
    fn parse_id(token: &str) -> Option<Self> {
        token.trim().parse().ok()
    }
}

impl ObjectId for String {
    fn parse_id(token: &str) -> Option<Self> {
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

impl ObjectId for StreamId {
    fn parse_id(token: &str) -> Option<Self> {
        StreamId::from_hex(token.trim())
    }
}

impl ObjectId for ClientHandle {
    fn parse_id(token: &str) -> Option<Self> {
        ClientHandle::from_hex(token.trim())
    }
}

/// Where a kind's identifier sits in its status body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRule {
    /// The first token is the id: `slice 0 mode=USB`.
    First,
    /// The second token is the id, the first is a sub-type word:
    /// `display pan 0x40000000 center=14.1`.
    Second,
    /// Every key carries the id as an `n.` prefix and several objects may
    /// share one line: `meter 1.nam=LEVEL#2.nam=SWR`.
    Dotted,
    /// The first token is `prefix<separator>id`, or a bare id. The prefix is
    /// applied as the property named by `prefix_token`.
    Composite {
        separator: char,
        prefix_token: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Property tables and lifecycle
// ---------------------------------------------------------------------------

/// The token-to-field table of a kind.
///
/// Implemented by [`property_table!`](crate::property_table).
pub trait PropertyTable {
    /// Apply one `token=value` pair. Returns `false` when the token is not
    /// in the table; the object is unchanged in that case.
    fn apply_property(&mut self, token: &str, value: &str) -> bool;

    /// Render every field that has a textual encoding as `(token, value)`
    /// pairs, in table order.
    fn encode_properties(&self) -> Vec<(&'static str, String)>;
}

/// Initialization bookkeeping.
///
/// `initialized` flips false to true the first time [`is_complete`]
/// holds and never reverts.
///
/// [`is_complete`]: Lifecycle::is_complete
pub trait Lifecycle {
    /// The kind's completeness predicate.
    fn is_complete(&self) -> bool;

    fn is_initialized(&self) -> bool;

    fn mark_initialized(&mut self);

    /// Flip `initialized` if the predicate newly holds. Returns `true` on
    /// the transition.
    fn check_initialized(&mut self) -> bool {
        if !self.is_initialized() && self.is_complete() {
            self.mark_initialized();
            true
        } else {
            false
        }
    }
}

/// A kind held in an [`ObjectCollection`](crate::collection::ObjectCollection).
pub trait RadioObject: PropertyTable + Lifecycle + Send + Sync + 'static {
    type Id: ObjectId;

    const KIND: ObjectKind;

    const ID_RULE: IdRule = IdRule::First;

    /// Substring of a status body that means "not in use". `None` for kinds
    /// the radio never removes through status.
    const REMOVAL: Option<&'static str> = Some("removed");

    /// Bare words that may appear in an in-use body and carry no property.
    const FLAGS: &'static [&'static str] = &[];

    /// Construct a fresh object with default fields.
    fn with_id(id: Self::Id) -> Self;

    fn id(&self) -> &Self::Id;
}

/// A kind with exactly one live instance and no identifier.
pub trait SingleObject: PropertyTable + Lifecycle + Default + Send + Sync + 'static {
    const KIND: ObjectKind;

    /// Token separator of the kind's status body.
    const SEPARATOR: char = ' ';
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

/// Generate a [`PropertyTable`] impl from a token-to-field list.
///
/// Each field's type must implement [`WireValue`](crate::codec::WireValue).
/// An optional `fallback` method is consulted for tokens outside the table
/// and must have the signature `fn(&mut self, &str, &str) -> bool`.
///
/// ```ignore
/// property_table!(Tnf {
///     "freq" => frequency,
///     "depth" => depth,
/// });
/// ```
#[macro_export]
macro_rules! property_table {
    ($ty:ty { $($token:literal => $field:ident),* $(,)? }) => {
        $crate::property_table!(@impl $ty, { $($token => $field),* }, |_this, _token, _value| false);
    };
    ($ty:ty { $($token:literal => $field:ident),* $(,)? } fallback = $fallback:ident) => {
        $crate::property_table!(@impl $ty, { $($token => $field),* }, |this, token, value| this.$fallback(token, value));
    };
    (@impl $ty:ty, { $($token:literal => $field:ident),* }, |$this:ident, $t:ident, $v:ident| $fallback:expr) => {
        impl $crate::object::PropertyTable for $ty {
            fn apply_property(&mut self, token: &str, value: &str) -> bool {
                match token {
                    $(
                        $token => {
                            self.$field = $crate::codec::WireValue::decode_wire(value);
                            true
                        }
                    )*
                    _ => {
                        let $this = self;
                        let $t = token;
                        let $v = value;
                        $fallback
                    }
                }
            }

            fn encode_properties(&self) -> Vec<(&'static str, String)> {
                vec![
                    $(($token, $crate::codec::WireValue::encode_wire(&self.$field))),*
                ]
            }
        }
    };
}

/// Generate a [`Lifecycle`] impl over an `initialized: bool` field and a
/// completeness expression evaluated with `self` bound to `$this`.
#[macro_export]
macro_rules! lifecycle {
    ($ty:ty, |$this:ident| $complete:expr) => {
        impl $crate::object::Lifecycle for $ty {
            fn is_complete(&self) -> bool {
                let $this = self;
                $complete
            }

            fn is_initialized(&self) -> bool {
                self.initialized
            }

            fn mark_initialized(&mut self) {
                self.initialized = true;
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Hz;

    #[derive(Debug, Default)]
    struct Probe {
        freq: Hz,
        name: String,
        level: i32,
        extra_seen: u32,
        initialized: bool,
    }

    impl Probe {
        fn extra(&mut self, token: &str, _value: &str) -> bool {
            if token == "legacy" {
                self.extra_seen += 1;
                true
            } else {
                false
            }
        }
    }

    crate::property_table!(Probe {
        "freq" => freq,
        "name" => name,
        "level" => level,
    } fallback = extra);

    crate::lifecycle!(Probe, |p| !p.freq.is_zero() && !p.name.is_empty());

    #[test]
    fn id_parsing() {
        assert_eq!(u16::parse_id("3"), Some(3));
        assert_eq!(u16::parse_id("x"), None);
        assert_eq!(u32::parse_id(" 12 "), Some(12));
        assert_eq!(String::parse_id("rxsc"), Some("rxsc".to_string()));
        assert_eq!(String::parse_id(""), None);
        assert_eq!(
            StreamId::parse_id("0x40000000"),
            Some(StreamId::new(0x4000_0000))
        );
        assert_eq!(ClientHandle::parse_id("zz"), None);
    }

    #[test]
    fn table_applies_known_tokens() {
        let mut p = Probe::default();
        assert!(p.apply_property("freq", "14.074000"));
        assert!(p.apply_property("level", "-12"));
        assert_eq!(p.freq, Hz(14_074_000));
        assert_eq!(p.level, -12);
    }

    #[test]
    fn table_rejects_unknown_tokens() {
        let mut p = Probe::default();
        assert!(!p.apply_property("bogus", "1"));
        assert_eq!(p.level, 0);
    }

    #[test]
    fn fallback_is_consulted() {
        let mut p = Probe::default();
        assert!(p.apply_property("legacy", "1"));
        assert_eq!(p.extra_seen, 1);
    }

    #[test]
    fn encode_in_table_order() {
        let p = Probe {
            freq: Hz(7_000_000),
            name: "a b".into(),
            level: 5,
            ..Probe::default()
        };
        assert_eq!(
            p.encode_properties(),
            vec![
                ("freq", "7.000000".to_string()),
                ("name", "a\u{7f}b".to_string()),
                ("level", "5".to_string()),
            ]
        );
    }

    #[test]
    fn initialization_is_monotonic() {
        let mut p = Probe::default();
        assert!(!p.check_initialized());
        p.apply_property("freq", "7.0");
        assert!(!p.check_initialized());
        p.apply_property("name", "x");
        assert!(p.check_initialized());
        assert!(p.is_initialized());
        p.apply_property("freq", "0");
        assert!(!p.check_initialized());
        assert!(p.is_initialized());
    }
}
