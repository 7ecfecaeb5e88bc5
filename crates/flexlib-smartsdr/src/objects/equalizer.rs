//! Receive and transmit graphic equalizers.
//!
//! There are exactly two, `rxsc` and `txsc`. The radio never removes them
//! through status, so they live until the collection is cleared.

use flexlib_core::ObjectKind;

use crate::object::RadioObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equalizer {
    pub id: String,
    pub initialized: bool,

    pub enabled: bool,
    pub level_63hz: i32,
    pub level_125hz: i32,
    pub level_250hz: i32,
    pub level_500hz: i32,
    pub level_1000hz: i32,
    pub level_2000hz: i32,
    pub level_4000hz: i32,
    pub level_8000hz: i32,
}

crate::property_table!(Equalizer {
    "mode" => enabled,
    "63Hz" => level_63hz,
    "125Hz" => level_125hz,
    "250Hz" => level_250hz,
    "500Hz" => level_500hz,
    "1000Hz" => level_1000hz,
    "2000Hz" => level_2000hz,
    "4000Hz" => level_4000hz,
    "8000Hz" => level_8000hz,
});

crate::lifecycle!(Equalizer, |_e| true);

impl RadioObject for Equalizer {
    type Id = String;
    const KIND: ObjectKind = ObjectKind::Equalizer;
    const REMOVAL: Option<&'static str> = None;

    fn with_id(id: String) -> Self {
        Equalizer {
            id,
            ..Equalizer::default()
        }
    }

    fn id(&self) -> &String {
        &self.id
    }
}
