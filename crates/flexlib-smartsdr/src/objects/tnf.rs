//! Tracking notch filters.

use flexlib_core::ObjectKind;

use crate::codec::Hz;
use crate::object::RadioObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tnf {
    pub id: u32,
    pub initialized: bool,

    pub frequency: Hz,
    /// Notch depth, 1 (normal) to 3 (very deep).
    pub depth: u32,
    /// Notch width.
    pub width: Hz,
    /// Survives a profile change.
    pub permanent: bool,
}

crate::property_table!(Tnf {
    "freq" => frequency,
    "depth" => depth,
    "width" => width,
    "permanent" => permanent,
});

crate::lifecycle!(Tnf, |t| !t.frequency.is_zero());

impl RadioObject for Tnf {
    type Id = u32;
    const KIND: ObjectKind = ObjectKind::Tnf;

    fn with_id(id: u32) -> Self {
        Tnf {
            id,
            ..Tnf::default()
        }
    }

    fn id(&self) -> &u32 {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tokenize;
    use crate::collection::ObjectCollection;

    #[test]
    fn tnf_lifecycle() {
        let mut tnfs = ObjectCollection::<Tnf>::new();
        let c = tnfs.parse_status(
            &tokenize("1 freq=14.101000 depth=2 width=0.000100 permanent=1", ' '),
            true,
        );
        assert!(c[0].initialized);
        let t = tnfs.get(&1).unwrap();
        assert_eq!(t.frequency, Hz(14_101_000));
        assert_eq!(t.width, Hz(100));
        assert!(t.permanent);

        tnfs.parse_status(&tokenize("1 removed", ' '), false);
        assert!(!tnfs.exists(&1));
    }
}
