//! SmartLink (`wan`) and waveform plug-in state.

use flexlib_core::ObjectKind;

use crate::codec::CommaList;
use crate::object::SingleObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wan {
    pub initialized: bool,

    pub server_connected: bool,
    pub radio_authenticated: bool,
    /// Handle returned by a successful `wan validate`.
    pub validated_handle: String,
}

crate::property_table!(Wan {
    "server_connected" => server_connected,
    "radio_authenticated" => radio_authenticated,
    "handle" => validated_handle,
});

crate::lifecycle!(Wan, |_w| true);

impl SingleObject for Wan {
    const KIND: ObjectKind = ObjectKind::Wan;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waveform {
    pub initialized: bool,

    pub installed: CommaList,
}

crate::property_table!(Waveform {
    "installed_list" => installed,
});

crate::lifecycle!(Waveform, |_w| true);

impl SingleObject for Waveform {
    const KIND: ObjectKind = ObjectKind::Waveform;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tokenize;
    use crate::collection::Singleton;

    #[test]
    fn wan_flags() {
        let mut wan = Singleton::<Wan>::default();
        let c = wan.parse_properties(&tokenize("server_connected=1 radio_authenticated=0", ' '));
        assert!(c.initialized);
        assert!(wan.get().server_connected);
        assert!(!wan.get().radio_authenticated);
    }

    #[test]
    fn waveform_list() {
        let mut wf = Singleton::<Waveform>::default();
        wf.parse_properties(&tokenize("installed_list=FreeDV,RADE", ' '));
        assert_eq!(wf.get().installed.0, vec!["FreeDV", "RADE"]);
    }
}
