//! The GPS receiver, reported as a `#`-separated status body.

use flexlib_core::ObjectKind;

use crate::object::SingleObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gps {
    pub initialized: bool,

    /// `Not Present`, `Fine Lock`, ...
    pub status: String,
    pub installed: bool,
    pub latitude: String,
    pub longitude: String,
    pub grid: String,
    pub altitude: String,
    pub tracked: u32,
    pub visible: u32,
    pub speed: String,
    pub frequency_error: String,
    pub time: String,
    pub track: f64,
}

crate::property_table!(Gps {
    "status" => status,
    "installed" => installed,
    "lat" => latitude,
    "lon" => longitude,
    "grid" => grid,
    "altitude" => altitude,
    "tracked" => tracked,
    "visible" => visible,
    "speed" => speed,
    "freq_error" => frequency_error,
    "time" => time,
    "track" => track,
});

crate::lifecycle!(Gps, |g| !g.status.is_empty());

impl SingleObject for Gps {
    const KIND: ObjectKind = ObjectKind::Gps;
    const SEPARATOR: char = '#';
}
