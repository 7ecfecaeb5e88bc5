//! USB cables (CAT, BCD and bit cables) attached to the radio.
//!
//! The first token is either the cable serial number or `type^serial`;
//! the prefix form carries the cable type inline.

use flexlib_core::ObjectKind;

use crate::object::{IdRule, RadioObject};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsbCable {
    pub id: String,
    pub initialized: bool,

    /// `cat`, `bcd`, `bit`, `ldpa`, `passthrough` or `invalid`.
    pub cable_type: String,
    pub name: String,
    pub enabled: bool,
    pub plugged_in: bool,
    pub auto_report: bool,
    pub source: String,
    pub source_rx_ant: String,
    pub source_tx_ant: String,
    pub source_slice: i32,
    pub band: String,
    pub polarity: String,
    pub speed: u32,
    pub data_bits: u8,
    pub parity: String,
    pub stop_bits: u8,
    pub flow_control: String,
    pub log: bool,
}

crate::property_table!(UsbCable {
    "type" => cable_type,
    "name" => name,
    "enable" => enabled,
    "plugged_in" => plugged_in,
    "auto_report" => auto_report,
    "source" => source,
    "source_rx_ant" => source_rx_ant,
    "source_tx_ant" => source_tx_ant,
    "source_slice" => source_slice,
    "band" => band,
    "polarity" => polarity,
    "speed" => speed,
    "data_bits" => data_bits,
    "parity" => parity,
    "stop_bits" => stop_bits,
    "flow_control" => flow_control,
    "log" => log,
});

crate::lifecycle!(UsbCable, |c| !c.cable_type.is_empty());

impl RadioObject for UsbCable {
    type Id = String;
    const KIND: ObjectKind = ObjectKind::UsbCable;
    const ID_RULE: IdRule = IdRule::Composite {
        separator: '^',
        prefix_token: "type",
    };

    fn with_id(id: String) -> Self {
        UsbCable {
            id,
            ..UsbCable::default()
        }
    }

    fn id(&self) -> &String {
        &self.id
    }
}
