//! The status router.
//!
//! Turns each control-connection line into store operations. `S` lines are
//! classified by their type word and handed to the matching collection or
//! single-instance object; `R` lines go to the reply correlator; `H` and
//! `V` set connection state; `M` lines are logged at their severity.
//!
//! Nothing here is fatal. A malformed line or an unknown status type is
//! logged and dropped, and the next line is processed normally.

use flexlib_core::{ClientHandle, Error, Result, StreamId, StreamKind};

use crate::codec::{self, ControlLine, MessageSeverity, Pair, RadioMessage, StatusLine, tokenize};
use crate::collection::{Change, ObjectCollection};
use crate::model::{Guarded, Model};
use crate::object::{RadioObject, SingleObject};
use crate::objects::{Atu, Gps, Radio, Wan, Waveform};

/// Route one control line. Errors are logged, never returned.
pub fn route_line(model: &Model, line: &str) {
    let parsed = match codec::parse_line(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping control line");
            return;
        }
    };

    match parsed {
        ControlLine::Version(version) => model.set_version(&version),
        ControlLine::Handle(handle) => model.set_handle(handle),
        ControlLine::Reply(reply) => {
            model.replies().handle_reply(model, &reply);
        }
        ControlLine::Status(status) => {
            if let Err(e) = route_status(model, &status) {
                tracing::warn!(error = %e, handle = %status.handle, "Dropping status line");
            }
        }
        ControlLine::Message(message) => log_message(&message),
        ControlLine::Unknown(line) => {
            tracing::warn!(line = %line, "Unrecognized control line");
        }
    }
}

/// Dispatch one status line by its type word.
pub fn route_status(model: &Model, status: &StatusLine) -> Result<()> {
    let body = status.body.as_str();

    match status.object_type.as_str() {
        "slice" => {
            for change in apply(model, &model.slices, body, ' ') {
                if change.removed {
                    model.remove_slice_meters(change.id);
                }
            }
        }
        "display" => route_display(model, body)?,
        "meter" => {
            apply(model, &model.meters, body, '#');
        }
        "tnf" => {
            apply(model, &model.tnfs, body, ' ');
        }
        "memory" => {
            apply(model, &model.memories, body, ' ');
        }
        "eq" => {
            apply(model, &model.equalizers, body, ' ');
        }
        "amplifier" => {
            apply(model, &model.amplifiers, body, ' ');
        }
        "xvtr" => {
            apply(model, &model.xvtrs, body, ' ');
        }
        "usb_cable" => {
            apply(model, &model.usb_cables, body, ' ');
        }
        "profile" => {
            apply(model, &model.profiles, body, ' ');
        }
        "client" => {
            apply(model, &model.gui_clients, body, ' ');
        }
        "interlock" | "transmit" if is_band_body(body) => {
            apply(model, &model.band_settings, body, ' ');
        }
        "interlock" => {
            model.apply_single(&model.interlock, &tokenize(body, ' '));
        }
        "transmit" => {
            model.apply_single(&model.transmit, &tokenize(body, ' '));
        }
        "radio" => route_radio(model, body),
        "atu" => apply_single::<Atu>(model, &model.atu, body),
        "gps" => apply_single::<Gps>(model, &model.gps, body),
        "wan" => apply_single::<Wan>(model, &model.wan, body),
        "waveform" => apply_single::<Waveform>(model, &model.waveform, body),
        "stream" => route_stream(model, status.handle, body)?,
        other => return Err(Error::UnknownStatus(other.to_string())),
    }
    Ok(())
}

/// Apply a body to a collection, deciding in-use from the kind's removal
/// sentinel.
fn apply<T: RadioObject>(
    model: &Model,
    collection: &Guarded<ObjectCollection<T>>,
    body: &str,
    separator: char,
) -> Vec<Change<T::Id>> {
    let in_use = T::REMOVAL.is_none_or(|sentinel| !body.contains(sentinel));
    model.apply_status(collection, &tokenize(body, separator), in_use)
}

fn apply_single<T: SingleObject>(
    model: &Model,
    single: &Guarded<crate::collection::Singleton<T>>,
    body: &str,
) {
    model.apply_single(single, &tokenize(body, T::SEPARATOR));
}

fn is_band_body(body: &str) -> bool {
    body == "band" || body.starts_with("band ")
}

fn route_display(model: &Model, body: &str) -> Result<()> {
    let sub_type = body.split_whitespace().next().unwrap_or_default();
    match sub_type {
        "pan" => {
            for change in apply(model, &model.panadapters, body, ' ') {
                if change.removed {
                    model.remove_panadapter_waterfalls(change.id);
                }
            }
        }
        "waterfall" => {
            apply(model, &model.waterfalls, body, ' ');
        }
        other => return Err(Error::UnknownStatus(format!("display {other}"))),
    }
    Ok(())
}

/// `radio` bodies may open with sub-object words (`oscillator`,
/// `filter_sharpness VOICE`, `static_net_params`). Those words are folded
/// into each following key: `oscillator state=x` applies `oscillator_state`.
fn route_radio(model: &Model, body: &str) {
    let pairs = tokenize(body, ' ');
    let prefix_len = pairs
        .iter()
        .take_while(|(_, value)| value.is_empty())
        .count();

    if prefix_len == 0 {
        model.apply_single(&model.radio, &pairs);
        return;
    }

    let prefix = pairs[..prefix_len]
        .iter()
        .map(|(key, _)| key.to_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    let keys: Vec<String> = pairs[prefix_len..]
        .iter()
        .map(|(key, _)| format!("{prefix}_{key}"))
        .collect();
    let folded: Vec<Pair<'_>> = keys
        .iter()
        .zip(&pairs[prefix_len..])
        .map(|(key, (_, value))| (key.as_str(), *value))
        .collect();

    if folded.is_empty() {
        tracing::trace!(prefix = %prefix, "Radio sub-status with no properties");
        return;
    }
    model.apply_single::<Radio>(&model.radio, &folded);
}

/// `stream <id> type=<kind> ...` creates or updates one of the six stream
/// kinds, but only for streams owned by this client. A body containing
/// `removed` deletes the id from whichever stream collection holds it.
fn route_stream(model: &Model, line_handle: ClientHandle, body: &str) -> Result<()> {
    let pairs = tokenize(body, ' ');
    let raw_id = pairs.first().map(|(key, _)| *key).unwrap_or_default();
    let id = StreamId::from_hex(raw_id)
        .ok_or_else(|| Error::MalformedLine(format!("invalid stream id: {raw_id}")))?;

    if body.contains("removed") {
        match model.remove_stream(id) {
            Some(kind) => tracing::debug!(kind = %kind, id = %id, "Stream removed"),
            None => tracing::trace!(id = %id, "Removal for unknown stream"),
        }
        return Ok(());
    }

    let value_of = |token: &str| {
        pairs
            .iter()
            .find(|(key, _)| *key == token)
            .map(|(_, value)| *value)
    };

    let owner = value_of("client_handle")
        .and_then(ClientHandle::from_hex)
        .unwrap_or(line_handle);
    if owner != model.handle() {
        tracing::trace!(id = %id, owner = %owner, "Ignoring stream owned by another client");
        return Ok(());
    }

    let kind = match value_of("type") {
        Some(token) => token
            .parse::<StreamKind>()
            .map_err(|e| Error::UnknownStatus(e.to_string()))?,
        None => match existing_stream_kind(model, id) {
            Some(kind) => kind,
            None => {
                tracing::trace!(id = %id, "Stream update before its type is known");
                return Ok(());
            }
        },
    };

    match kind {
        StreamKind::DaxRx => apply_stream(model, &model.dax_rx_streams, &pairs),
        StreamKind::DaxTx => apply_stream(model, &model.dax_tx_streams, &pairs),
        StreamKind::DaxMic => apply_stream(model, &model.dax_mic_streams, &pairs),
        StreamKind::DaxIq => apply_stream(model, &model.dax_iq_streams, &pairs),
        StreamKind::RemoteAudioRx => apply_stream(model, &model.remote_rx_streams, &pairs),
        StreamKind::RemoteAudioTx => apply_stream(model, &model.remote_tx_streams, &pairs),
    }
    Ok(())
}

fn apply_stream<T: RadioObject>(
    model: &Model,
    collection: &Guarded<ObjectCollection<T>>,
    pairs: &[Pair<'_>],
) {
    model.apply_status(collection, pairs, true);
}

fn existing_stream_kind(model: &Model, id: StreamId) -> Option<StreamKind> {
    if model.dax_rx_streams.read(|c| c.exists(&id)) {
        Some(StreamKind::DaxRx)
    } else if model.dax_tx_streams.read(|c| c.exists(&id)) {
        Some(StreamKind::DaxTx)
    } else if model.dax_mic_streams.read(|c| c.exists(&id)) {
        Some(StreamKind::DaxMic)
    } else if model.dax_iq_streams.read(|c| c.exists(&id)) {
        Some(StreamKind::DaxIq)
    } else if model.remote_rx_streams.read(|c| c.exists(&id)) {
        Some(StreamKind::RemoteAudioRx)
    } else if model.remote_tx_streams.read(|c| c.exists(&id)) {
        Some(StreamKind::RemoteAudioTx)
    } else {
        None
    }
}

fn log_message(message: &RadioMessage) {
    let code = format!("0x{:08X}", message.code);
    match message.severity() {
        MessageSeverity::Info => tracing::info!(code = %code, "{}", message.text),
        MessageSeverity::Warning => tracing::warn!(code = %code, "{}", message.text),
        MessageSeverity::Error | MessageSeverity::Fatal => {
            tracing::error!(code = %code, "{}", message.text)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Hz;
    use flexlib_core::ModelEvent;

    const OWN: &str = "0x1A2B3C4D";

    fn model_with_handle() -> Model {
        let model = Model::default();
        route_line(&model, &format!("H{}", &OWN[2..]));
        model
    }

    #[test]
    fn handle_and_version_lines() {
        let model = Model::default();
        let mut rx = model.subscribe();
        route_line(&model, "V1.4.0.0");
        route_line(&model, "H1A2B3C4D");
        assert_eq!(model.version(), "1.4.0.0");
        assert_eq!(model.handle(), ClientHandle::new(0x1A2B_3C4D));
        assert_eq!(
            rx.try_recv().unwrap(),
            ModelEvent::Version {
                version: "1.4.0.0".into()
            }
        );
    }

    #[test]
    fn slice_lifecycle_through_router() {
        let model = Model::default();
        route_line(&model, "S0|slice 0 in_use=1 RF_frequency=14.074000 mode=DIGU");
        route_line(&model, "S0|slice 0 in_use=1 RF_frequency=14.074000 mode=DIGU");
        assert_eq!(model.slices.read(|s| s.len()), 1);
        assert_eq!(
            model.slices.read(|s| s.get(&0).map(|x| x.frequency)),
            Some(Hz(14_074_000))
        );
        route_line(&model, "S0|slice 0 in_use=0");
        assert!(model.slices.read(|s| s.is_empty()));
    }

    #[test]
    fn unknown_type_is_dropped() {
        let model = Model::default();
        let status = StatusLine {
            handle: ClientHandle::NONE,
            object_type: "bogus".into(),
            body: "1 x=1".into(),
        };
        assert!(matches!(
            route_status(&model, &status),
            Err(Error::UnknownStatus(t)) if t == "bogus"
        ));
        route_line(&model, "S0|bogus 1 x=1");
    }

    #[test]
    fn display_routes_by_sub_type() {
        let model = Model::default();
        route_line(&model, "S0|display pan 0x40000000 center=14.1 bandwidth=0.2 max_dbm=-40");
        route_line(&model, "S0|display waterfall 0x42000000 panadapter=0x40000000");
        assert_eq!(model.panadapters.read(|p| p.len()), 1);
        assert_eq!(model.waterfalls.read(|w| w.len()), 1);

        route_line(&model, "S0|display pan 0x40000000 removed");
        assert!(model.panadapters.read(|p| p.is_empty()));
        assert!(model.waterfalls.read(|w| w.is_empty()));
    }

    #[test]
    fn band_lines_go_to_band_settings() {
        let model = Model::default();
        route_line(&model, "S0|interlock band 9 band_name=20 tx1_enabled=1");
        route_line(&model, "S0|transmit band 9 rfpower=50");
        route_line(&model, "S0|interlock state=READY tx_allowed=1");
        route_line(&model, "S0|transmit freq=14.2 rfpower=90");

        model.band_settings.read(|b| {
            let band = b.get(&9).unwrap();
            assert_eq!(band.band_name, "20");
            assert_eq!(band.rf_power, 50);
        });
        assert_eq!(model.interlock.read(|i| i.get().state.clone()), "READY");
        assert_eq!(model.transmit.read(|t| t.get().rf_power), 90);
    }

    #[test]
    fn radio_sub_words_are_folded() {
        let model = Model::default();
        route_line(&model, "S0|radio oscillator state=gpsdo setting=auto locked=1");
        route_line(&model, "S0|radio filter_sharpness VOICE level=2 auto_level=1");
        route_line(&model, "S0|radio slices=4 panadapters=4");
        model.radio.read(|r| {
            let radio = r.get();
            assert_eq!(radio.oscillator_state, "gpsdo");
            assert!(radio.oscillator_locked);
            assert_eq!(radio.filter_voice_level, 2);
            assert!(radio.filter_voice_auto);
            assert_eq!(radio.available_slices, 4);
        });
    }

    #[test]
    fn meter_and_gps_use_hash_separator() {
        let model = Model::default();
        route_line(&model, "S0|meter 4.src=SLC#4.num=0#4.nam=LEVEL#4.unit=dBm#");
        route_line(&model, "S0|gps lat=42.5#lon=-71.2#status=Fine Lock");
        assert!(model.meters.read(|m| m.exists(&4)));
        assert_eq!(model.gps.read(|g| g.get().status.clone()), "Fine Lock");
        route_line(&model, "S0|meter 4 removed");
        assert!(!model.meters.read(|m| m.exists(&4)));
    }

    #[test]
    fn slice_removal_removes_its_meters() {
        let model = Model::default();
        route_line(&model, "S0|slice 2 in_use=1 mode=AM");
        route_line(&model, "S0|meter 8.src=SLC#8.num=2#8.nam=LEVEL");
        route_line(&model, "S0|slice 2 in_use=0");
        assert!(model.meters.read(|m| m.is_empty()));
    }

    #[test]
    fn stream_ownership_is_checked() {
        let model = model_with_handle();
        route_line(
            &model,
            &format!("S{}|stream 0x04000008 type=dax_rx dax_channel=1 client_handle={OWN}", &OWN[2..]),
        );
        route_line(
            &model,
            "S0|stream 0x04000009 type=dax_rx dax_channel=2 client_handle=0x99999999",
        );
        assert!(model.dax_rx_streams.read(|s| s.exists(&StreamId::new(0x0400_0008))));
        assert!(!model.dax_rx_streams.read(|s| s.exists(&StreamId::new(0x0400_0009))));
        assert!(
            model
                .dax_rx_streams
                .read(|s| s.get(&StreamId::new(0x0400_0008)).unwrap().initialized)
        );
    }

    #[test]
    fn stream_kinds_and_removal() {
        let model = model_with_handle();
        let handle = &OWN[2..];
        route_line(&model, &format!("S{handle}|stream 0x20000000 type=dax_iq daxiq_channel=1 pan=0x40000000"));
        route_line(&model, &format!("S{handle}|stream 0x84000000 type=remote_audio_rx compression=OPUS"));
        route_line(&model, &format!("S{handle}|stream 0x20000000 daxiq_rate=48000"));

        assert_eq!(
            model.dax_iq_streams.read(|s| s.get(&StreamId::new(0x2000_0000)).map(|x| x.rate)),
            Some(48_000)
        );
        assert_eq!(model.remote_rx_streams.read(|s| s.len()), 1);

        route_line(&model, "S0|stream 0x20000000 removed");
        assert!(model.dax_iq_streams.read(|s| s.is_empty()));
    }

    #[test]
    fn unknown_stream_type_is_dropped() {
        let model = model_with_handle();
        let status = StatusLine {
            handle: model.handle(),
            object_type: "stream".into(),
            body: "0x10000000 type=bogus".into(),
        };
        assert!(matches!(
            route_status(&model, &status),
            Err(Error::UnknownStatus(_))
        ));
    }

    #[test]
    fn client_lines() {
        let model = Model::default();
        route_line(&model, "S0|client 0x1234ABCD connected program=SmartSDR-Win station=Shack");
        assert_eq!(model.gui_clients.read(|c| c.len()), 1);
        route_line(&model, "S0|client 0x1234ABCD disconnected forced=0");
        assert!(model.gui_clients.read(|c| c.is_empty()));
    }

    #[test]
    fn replies_reach_correlator() {
        let model = Model::default();
        model.replies().add_reply_handler(3, "radio uptime", None);
        route_line(&model, "R3|0|1234");
        assert_eq!(model.radio.read(|r| r.get().uptime), 1234);
        assert_eq!(model.replies().pending(), 0);
    }

    #[test]
    fn malformed_and_message_lines_do_not_panic() {
        let model = Model::default();
        route_line(&model, "");
        route_line(&model, "S0 no pipe");
        route_line(&model, "Rnot|a|reply");
        route_line(&model, "M10000001|Client connected");
        route_line(&model, "M5|03000002|Fatal thing");
        route_line(&model, "Xwhatever");
    }
}
