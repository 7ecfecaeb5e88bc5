//! External amplifiers registered with the radio.

use flexlib_core::{ClientHandle, ObjectKind};

use crate::object::RadioObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Amplifier {
    pub id: ClientHandle,
    pub initialized: bool,

    pub model: String,
    pub serial_number: String,
    pub ip: String,
    pub port: u16,
    pub antenna: String,
    /// Operating state as reported by the amplifier (`STANDBY`, `OPERATE`, ...).
    pub state: String,
}

crate::property_table!(Amplifier {
    "model" => model,
    "serial_num" => serial_number,
    "ip" => ip,
    "port" => port,
    "ant" => antenna,
    "state" => state,
});

crate::lifecycle!(Amplifier, |a| !a.model.is_empty());

impl RadioObject for Amplifier {
    type Id = ClientHandle;
    const KIND: ObjectKind = ObjectKind::Amplifier;

    fn with_id(id: ClientHandle) -> Self {
        Amplifier {
            id,
            ..Amplifier::default()
        }
    }

    fn id(&self) -> &ClientHandle {
        &self.id
    }
}
