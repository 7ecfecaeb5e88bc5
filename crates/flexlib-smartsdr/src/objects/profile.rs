//! Saved profile lists (`global`, `tx`, `mic`, `displays`).

use flexlib_core::ObjectKind;

use crate::codec::CaretList;
use crate::object::RadioObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub id: String,
    pub initialized: bool,

    pub list: CaretList,
    pub current: String,
}

crate::property_table!(Profile {
    "list" => list,
    "current" => current,
});

crate::lifecycle!(Profile, |_p| true);

impl RadioObject for Profile {
    type Id = String;
    const KIND: ObjectKind = ObjectKind::Profile;
    const REMOVAL: Option<&'static str> = None;

    fn with_id(id: String) -> Self {
        Profile {
            id,
            ..Profile::default()
        }
    }

    fn id(&self) -> &String {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tokenize;
    use crate::collection::ObjectCollection;

    #[test]
    fn list_and_current() {
        let mut profiles = ObjectCollection::<Profile>::new();
        profiles.parse_status(&tokenize("global list=Default^Contest^DX^", ' '), true);
        profiles.parse_status(&tokenize("global current=Contest", ' '), true);
        let p = profiles.get(&"global".to_string()).unwrap();
        assert_eq!(p.list.0, vec!["Default", "Contest", "DX"]);
        assert_eq!(p.current, "Contest");
    }
}
