//! End-to-end session tests against the scripted mock radio.

use std::time::Duration;

use flexlib_core::{Error, ModelEvent, ObjectKind, StreamId, StreamKind};
use flexlib_smartsdr::{Session, SessionBuilder, Transports};
use flexlib_test_harness::packets::{METER_CLASS, meter_payload, vita_packet};
use flexlib_test_harness::{ClientEnds, MockRadio};
use tokio::net::UdpSocket;

const HANDLE: u32 = 0x0000_002A;

async fn start(client: ClientEnds, builder: SessionBuilder) -> Session {
    builder
        .build_with_transports(Transports {
            tcp_read: Box::new(client.read),
            tcp_write: Box::new(client.write),
        })
        .await
        .unwrap()
}

/// Poll `check` until it holds or a second passes.
async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn registration_and_radio_info() {
    let (mut radio, client) = MockRadio::pair();
    radio.handshake("1.4.0.0", HANDLE).await.unwrap();
    radio
        .expect("client program logger", 0, "")
        .expect("sub slice all", 0, "")
        .then_status(&["S0000002A|slice 0 in_use=1 RF_frequency=14.074000 mode=DIGU rxant=ANT1"])
        .expect(
            "info",
            0,
            r#"model="FLEX-6600",chassis_serial="1234-5678",nickname="Shack",callsign="N0CALL""#,
        )
        .expect("version", 0, "SmartSDR-MB=3.4.5.123#FPGA-MB=2.1.0")
        .expect("slice list", 0, "0")
        .expect("ant list", 0, "ANT1,ANT2,RX_A")
        .expect("mic list", 0, "MIC,BAL,LINE");
    let script = radio.start();

    let session = start(
        client,
        SessionBuilder::new()
            .client_name("logger")
            .subscriptions(["slice all"]),
    )
    .await;
    assert_eq!(session.model().handle().raw(), HANDLE);
    assert_eq!(session.model().version(), "1.4.0.0");

    session.request_radio_info().await.unwrap();
    let radio = script.await.unwrap().unwrap();

    let model = session.model();
    assert!(eventually(|| model.radio.read(|r| !r.get().mic_list.is_empty())).await);
    model.radio.read(|r| {
        let r = r.get();
        assert_eq!(r.model, "FLEX-6600");
        assert_eq!(r.serial, "1234-5678");
        assert_eq!(r.nickname, "Shack");
        assert_eq!(r.versions.get("FPGA-MB").map(String::as_str), Some("2.1.0"));
        assert_eq!(r.slice_list, vec![0]);
        assert_eq!(r.antenna_list, vec!["ANT1", "ANT2", "RX_A"]);
    });
    model.slices.read(|s| {
        let slice = s.get(&0).unwrap();
        assert!(slice.initialized);
        assert_eq!(slice.frequency.hz(), 14_074_000);
        assert_eq!(slice.rx_ant, "ANT1");
    });
    assert_eq!(model.replies().pending(), 0);

    let mut events = session.subscribe();
    radio.close().await.unwrap();
    assert!(eventually(|| !session.is_connected()).await);
    assert_eq!(events.recv().await.unwrap(), ModelEvent::Cleared);
    assert_eq!(model.slices.read(|s| s.len()), 0);
}

#[tokio::test]
async fn stream_create_and_status() {
    let (mut radio, client) = MockRadio::pair();
    radio.handshake("1.4.0.0", HANDLE).await.unwrap();
    let session = start(client, SessionBuilder::new().auto_subscribe(false)).await;
    let mut events = session.subscribe();

    let radio_side = tokio::spawn(async move {
        let seq = radio
            .expect_command("stream create type=dax_rx dax_channel=1")
            .await?;
        radio.reply(seq, 0, "0x04000008").await?;
        radio
            .status(
                HANDLE,
                "stream 0x04000008 type=dax_rx dax_channel=1 slice=0 client_handle=0x0000002A",
            )
            .await?;
        // Another client's stream is not ours to model.
        radio
            .status(
                0x0000_0099,
                "stream 0x04000009 type=dax_rx dax_channel=2 client_handle=0x00000099",
            )
            .await?;
        Ok::<_, Error>(radio)
    });

    let id = session.create_stream(StreamKind::DaxRx, Some(1)).await.unwrap();
    assert_eq!(id, StreamId::new(0x0400_0008));
    let _radio = radio_side.await.unwrap().unwrap();

    let added = events.recv().await.unwrap();
    assert_eq!(
        added,
        ModelEvent::Added {
            kind: ObjectKind::DaxRxAudioStream,
            id: id.to_string()
        }
    );
    let model = session.model();
    assert!(
        eventually(|| model
            .dax_rx_streams
            .read(|s| s.get(&id).map(|x| x.dax_channel) == Some(1)))
        .await
    );
    assert!(!model.dax_rx_streams.read(|s| s.exists(&StreamId::new(0x0400_0009))));
}

#[tokio::test]
async fn command_errors_and_timeouts() {
    let (mut radio, client) = MockRadio::pair();
    radio.handshake("1.4.0.0", HANDLE).await.unwrap();
    let session = start(
        client,
        SessionBuilder::new()
            .auto_subscribe(false)
            .command_timeout(Duration::from_millis(100)),
    )
    .await;

    let radio_side = tokio::spawn(async move {
        let seq = radio.expect_command("slice remove 9").await?;
        radio.reply(seq, 0x5000_003C, "").await?;
        // Read the second command but answer only after the client gives up.
        let seq = radio.expect_command("slice list").await?;
        tokio::time::sleep(Duration::from_millis(250)).await;
        radio.reply(seq, 0, "0 1").await?;
        Ok::<_, Error>(radio)
    });

    match session.send_command("slice remove 9").await {
        Err(Error::Command { code, message }) => {
            assert_eq!(code, 0x5000_003C);
            assert_eq!(message, "object not found");
        }
        other => panic!("expected a command error, got {other:?}"),
    }

    assert!(matches!(
        session.send_command("slice list").await,
        Err(Error::Timeout)
    ));
    let _radio = radio_side.await.unwrap().unwrap();

    // The late reply finds nothing pending and changes nothing.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.model().replies().pending(), 0);
    assert!(session.model().radio.read(|r| r.get().slice_list.is_empty()));
    assert!(session.is_connected());
}

#[tokio::test]
async fn datagrams_update_meters() {
    let (mut radio, client) = MockRadio::pair();
    radio.handshake("1.4.0.0", HANDLE).await.unwrap();
    let session = start(client, SessionBuilder::new().auto_subscribe(false)).await;

    radio
        .status(HANDLE, "meter 4.src=RAD#4.num=1#4.nam=PATEMP#4.unit=degC#")
        .await
        .unwrap();
    let model = session.model();
    assert!(eventually(|| model.meters.read(|m| m.exists(&4))).await);

    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    session.run_datagrams(socket).await;

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let packet = vita_packet(0x0000_0700, METER_CLASS, 0, &meter_payload(&[(4, 45 * 64)]));
    sender.send_to(&packet, addr).await.unwrap();

    assert!(eventually(|| model.meters.read(|m| m.get(&4).map(|x| x.value)) == Some(45.0)).await);

    session.disconnect().await.unwrap();
    assert!(!session.is_connected());
    assert_eq!(model.meters.read(|m| m.len()), 0);
    assert!(matches!(session.send("info").await, Err(Error::NotConnected)));
}
