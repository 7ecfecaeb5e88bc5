//! Every object kind the status protocol describes.
//!
//! Each kind is a plain struct plus its token table, completeness
//! predicate and identifier convention. The algorithms that drive them
//! live in [`collection`](crate::collection).

mod amplifier;
mod band_setting;
mod equalizer;
mod gps;
mod gui_client;
mod memory;
mod meter;
mod panadapter;
mod profile;
mod radio;
mod slice;
mod streams;
mod tnf;
mod transmit;
mod usb_cable;
mod wan;
mod xvtr;

pub use amplifier::Amplifier;
pub use band_setting::BandSetting;
pub use equalizer::Equalizer;
pub use gps::Gps;
pub use gui_client::GuiClient;
pub use memory::Memory;
pub use meter::{Meter, SOURCE_SLICE, scale_meter_value};
pub use panadapter::{Panadapter, Waterfall};
pub use profile::Profile;
pub use radio::Radio;
pub use slice::Slice;
pub use streams::{
    DaxIqStream, DaxMicAudioStream, DaxRxAudioStream, DaxTxAudioStream, RemoteRxAudioStream,
    RemoteTxAudioStream,
};
pub use tnf::Tnf;
pub use transmit::{Atu, Interlock, Transmit};
pub use usb_cable::UsbCable;
pub use wan::{Wan, Waveform};
pub use xvtr::Xvtr;
