//! Other clients connected to the same radio.

use flexlib_core::{ClientHandle, ObjectKind};

use crate::object::RadioObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuiClient {
    pub id: ClientHandle,
    pub initialized: bool,

    pub client_id: String,
    pub program: String,
    pub station: String,
    pub local_ptt: bool,
    pub available: bool,
}

crate::property_table!(GuiClient {
    "client_id" => client_id,
    "program" => program,
    "station" => station,
    "local_ptt" => local_ptt,
    "available" => available,
});

crate::lifecycle!(GuiClient, |c| !c.program.is_empty());

impl RadioObject for GuiClient {
    type Id = ClientHandle;
    const KIND: ObjectKind = ObjectKind::GuiClient;
    const REMOVAL: Option<&'static str> = Some("disconnected");
    const FLAGS: &'static [&'static str] = &["connected"];

    fn with_id(id: ClientHandle) -> Self {
        GuiClient {
            id,
            ..GuiClient::default()
        }
    }

    fn id(&self) -> &ClientHandle {
        &self.id
    }
}
