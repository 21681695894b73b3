//! Gateway behaviour against a scripted radio module on an in-memory link.

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::codec::FramedRead;

use enocean_gateway::{
    observable, BaseIdChangeError, Esp3Codec, Gateway, GatewayError, GatewayOptions, StateChange, StateChangeSource,
};
use enocean_protocol::{
    encode_packet, Action, ActionUid, Address, ChannelAction, CommonCommand, EepError, EepId, EepMessage, EepValue,
    Erp1Telegram, Esp3Packet, PacketType, ProtocolError, ResponseTelegram, ReturnCode, Rorg, SetCoverPositionAction,
    SetFanSpeedAction, TeachIn,
    UteMessage, UteResponseType,
};

const SENDER: u32 = 0xFF80_0080;

/// The module end of the link.
struct Module {
    frames: FramedRead<ReadHalf<DuplexStream>, Esp3Codec>,
    writer: WriteHalf<DuplexStream>,
}

impl Module {
    async fn next_packet(&mut self) -> Esp3Packet {
        tokio::time::timeout(Duration::from_secs(30), self.frames.next())
            .await
            .expect("no packet from gateway")
            .expect("link closed")
            .expect("read failed")
    }

    async fn write_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    async fn send(&mut self, packet: &Esp3Packet) {
        self.write_raw(&encode_packet(packet).unwrap()).await;
    }

    async fn reply(&mut self, return_code: ReturnCode, data: &[u8], optional: &[u8]) {
        let response = ResponseTelegram {
            return_code,
            response_data: Bytes::copy_from_slice(data),
            optional: Bytes::copy_from_slice(optional),
        };
        self.send(&response.to_packet()).await;
    }

    async fn radio(&mut self, rorg: Rorg, data: &[u8], sender: Address) {
        let telegram = Erp1Telegram::new(rorg, data.to_vec(), sender, Address::Broadcast);
        self.send(&telegram.to_packet()).await;
    }
}

fn setup() -> (Gateway, Module) {
    let (host, module) = tokio::io::duplex(4096);
    let options = GatewayOptions {
        sender_address: Some(Address::from_u32(SENDER)),
        ..GatewayOptions::default()
    };
    let gateway = Gateway::start(host, options);
    let (reader, writer) = tokio::io::split(module);
    let module = Module {
        frames: FramedRead::new(reader, Esp3Codec),
        writer,
    };
    (gateway, module)
}

async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("no event")
        .expect("channel closed")
}

fn temperature_sensor() -> Address {
    Address::from_u32(0x0181_0001)
}

fn blind() -> Address {
    Address::from_u32(0x05A0_0001)
}

const A5_02_05: EepId = EepId::new(0xA5, 0x02, 0x05);
const D2_05_00: EepId = EepId::new(0xD2, 0x05, 0x00);
const A5_38_08: EepId = EepId::new(0xA5, 0x38, 0x08);
const D2_20_02: EepId = EepId::new(0xD2, 0x20, 0x02);

#[tokio::test]
async fn test_response_after_noise_is_correlated() {
    let (gateway, mut module) = setup();

    let module_side = async {
        let request = module.next_packet().await;
        assert_eq!(request.packet_type, PacketType::CommonCommand);
        assert_eq!(&request.data[..], &[0x08]);
        module.write_raw(&[0x00, 0xFF, 0x13, 0x55, 0x01]).await;
        module.reply(ReturnCode::Ok, &[0xFF, 0x80, 0x00, 0x00], &[0x0A]).await;
    };
    let (base_id, _) = tokio::join!(gateway.base_id(), module_side);

    assert_eq!(base_id.unwrap().map(|b| b.value()), Some(0xFF80_0000));
    // served from the cache, the module would not answer again
    assert_eq!(gateway.base_id_remaining_write_cycles().await.unwrap(), Some(10));
}

#[tokio::test(start_paused = true)]
async fn test_send_without_response_times_out() {
    let (gateway, _module) = setup();

    let start = Instant::now();
    let response = gateway.send(CommonCommand::ReadVersion.to_packet()).await.unwrap();
    let elapsed = start.elapsed();

    assert!(response.is_none());
    assert!(elapsed >= Duration::from_millis(500), "returned early: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(600), "returned late: {:?}", elapsed);
}

#[tokio::test]
async fn test_oversized_packet_rejected_before_writing() {
    let (gateway, mut module) = setup();

    let oversized = Esp3Packet::new(PacketType::CommonCommand, vec![0x08], vec![0u8; 300]);
    let result = gateway.send(oversized).await;
    assert!(matches!(
        result,
        Err(GatewayError::Protocol(ProtocolError::PacketTooLarge { section: "optional", .. }))
    ));

    let module_side = async {
        let request = module.next_packet().await;
        assert_eq!(&request.data[..], &[0x08]);
        assert!(request.optional.is_empty());
        module.reply(ReturnCode::Ok, &[0xFF, 0x80, 0x00, 0x00], &[0x0A]).await;
    };
    let (base_id, _) = tokio::join!(gateway.base_id(), module_side);
    assert_eq!(base_id.unwrap().map(|b| b.value()), Some(0xFF80_0000));
}

#[tokio::test]
async fn test_transport_close_fails_pending_send() {
    let (gateway, mut module) = setup();

    let module_side = async move {
        module.next_packet().await;
        drop(module);
    };
    let (result, _) = tokio::join!(gateway.send(CommonCommand::ReadVersion.to_packet()), module_side);
    assert!(matches!(result, Err(GatewayError::ConnectionClosed)));

    let result = gateway.register_device(temperature_sensor(), A5_02_05).await;
    assert!(matches!(result, Err(GatewayError::ConnectionClosed)));
}

#[tokio::test]
async fn test_send_action_returns_commanded_state() {
    let (gateway, mut module) = setup();
    assert!(gateway.register_device(blind(), D2_05_00).await.unwrap());

    let (sent_tx, mut sent_rx) = mpsc::unbounded_channel();
    gateway.on_sent(move |packet| {
        let _ = sent_tx.send(packet.clone());
    });

    let action = SetCoverPositionAction::new(75, 20).unwrap();
    let module_side = async {
        let packet = module.next_packet().await;
        let telegram = Erp1Telegram::parse(&packet).unwrap();
        assert_eq!(telegram.rorg, Rorg::Vld);
        assert_eq!(&telegram.data[..], &[75, 20, 0x00, 0xF1]);
        assert_eq!(telegram.sender, Address::from_u32(SENDER));
        assert_eq!(telegram.destination, Some(blind()));
        module.reply(ReturnCode::Ok, &[], &[]).await;
    };
    let (result, _) = tokio::join!(gateway.send_action(action, blind()), module_side);

    let changes = result.unwrap().expect("module confirmed");
    let value = |uid: &str| {
        changes
            .iter()
            .find(|c| c.observable_uid == uid)
            .map(|c| c.value.clone())
    };
    assert_eq!(value(observable::POSITION), Some(EepValue::Number(75.0)));
    assert_eq!(value(observable::ANGLE), Some(EepValue::Number(20.0)));
    assert!(changes.iter().all(|c| c.device_address == blind()));

    let sent = next(&mut sent_rx).await;
    assert_eq!(sent.packet_type, PacketType::RadioErp1);
}

#[tokio::test]
async fn test_send_action_failure_code_is_error() {
    let (gateway, mut module) = setup();
    gateway.register_device(blind(), D2_05_00).await.unwrap();

    let module_side = async {
        module.next_packet().await;
        module.reply(ReturnCode::LockSet, &[], &[]).await;
    };
    let action = Action::StopCover(ChannelAction::all());
    let (result, _) = tokio::join!(gateway.send_action(action, blind()), module_side);

    match result {
        Err(GatewayError::CommandFailed { code }) => assert_eq!(code, ReturnCode::LockSet),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_send_action_rejected_before_sending() {
    let (gateway, _module) = setup();

    let action = Action::StopCover(ChannelAction::all());
    let result = gateway.send_action(action, blind()).await;
    assert!(matches!(result, Err(GatewayError::UnknownDevice(address)) if address == blind()));

    let dimmer = Address::from_u32(0x0190_0001);
    gateway.register_device(dimmer, A5_38_08).await.unwrap();
    let result = gateway.send_action(action, dimmer).await;
    assert!(matches!(
        result,
        Err(GatewayError::Eep(EepError::UnsupportedAction(ActionUid::StopCover)))
    ));

    let unknown_profile = Address::from_u32(0x0190_0002);
    let eep = EepId::new(0xA5, 0x99, 0x01);
    assert!(!gateway.register_device(unknown_profile, eep).await.unwrap());
    let result = gateway.send_action(action, unknown_profile).await;
    assert!(matches!(result, Err(GatewayError::NoProfile(e)) if e == eep));
}

#[tokio::test]
async fn test_listener_layering_and_new_device_once() {
    let (gateway, mut module) = setup();
    gateway.register_device(temperature_sensor(), A5_02_05).await.unwrap();

    let (log_tx, mut log_rx) = mpsc::unbounded_channel::<String>();
    let tx = log_tx.clone();
    gateway.on_packet(move |_| {
        let _ = tx.send("packet".into());
    });
    let tx = log_tx.clone();
    gateway.on_erp1(None, move |t| {
        let _ = tx.send(format!("erp1 {}", t.sender));
    });
    let tx = log_tx.clone();
    gateway.on_new_device(move |address| {
        let _ = tx.send(format!("new {}", address));
    });
    let tx = log_tx.clone();
    gateway.on_eep_message(None, move |m: &EepMessage| {
        let _ = tx.send(format!("eep {}", m.sender.map(|a| a.to_string()).unwrap_or_default()));
    });

    let stranger = Address::from_u32(0x0029_8979);
    module.radio(Rorg::Rps, &[0x30], stranger).await;
    module.radio(Rorg::Rps, &[0x00], stranger).await;
    module.radio(Rorg::Bs4, &[0x00, 0x00, 0x80, 0x08], temperature_sensor()).await;

    let mut log = Vec::new();
    loop {
        let entry = next(&mut log_rx).await;
        let done = entry.starts_with("eep");
        log.push(entry);
        if done {
            break;
        }
    }
    assert_eq!(
        log,
        vec![
            "packet".to_string(),
            "erp1 00:29:89:79".into(),
            "new 00:29:89:79".into(),
            "packet".into(),
            "erp1 00:29:89:79".into(),
            "packet".into(),
            "erp1 01:81:00:01".into(),
            "eep 01:81:00:01".into(),
        ]
    );
}

#[tokio::test]
async fn test_state_changes_and_address_filter() {
    let (gateway, mut module) = setup();
    let other = Address::from_u32(0x0181_0002);
    gateway.register_device(temperature_sensor(), A5_02_05).await.unwrap();
    gateway.register_device(other, A5_02_05).await.unwrap();

    let (eep_tx, mut eep_rx) = mpsc::unbounded_channel();
    gateway.on_eep_message(Some(temperature_sensor()), move |m| {
        let _ = eep_tx.send(m.sender);
    });
    let (state_tx, mut state_rx) = mpsc::unbounded_channel::<StateChange>();
    gateway.on_state_change(move |change| {
        let _ = state_tx.send(change.clone());
    });

    module.radio(Rorg::Bs4, &[0x00, 0x00, 0x80, 0x08], other).await;
    module.radio(Rorg::Bs4, &[0x00, 0x00, 0xFF, 0x08], temperature_sensor()).await;

    assert_eq!(next(&mut eep_rx).await, Some(temperature_sensor()));

    let mut temperatures = Vec::new();
    while temperatures.len() < 2 {
        let change = next(&mut state_rx).await;
        assert_eq!(change.source, StateChangeSource::Telegram);
        if change.observable_uid == observable::TEMPERATURE {
            temperatures.push((change.device_address, change.value.as_f64().unwrap()));
        }
    }
    assert_eq!(temperatures[0].0, other);
    assert_eq!(temperatures[1], (temperature_sensor(), 0.0));
    assert!(eep_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_fan_speed_commanded_and_reported() {
    let (gateway, mut module) = setup();
    let fan = Address::from_u32(0x0520_0002);
    assert!(gateway.register_device(fan, D2_20_02).await.unwrap());

    let (state_tx, mut state_rx) = mpsc::unbounded_channel::<StateChange>();
    gateway.on_state_change(move |change| {
        let _ = state_tx.send(change.clone());
    });

    let module_side = async {
        let packet = module.next_packet().await;
        let telegram = Erp1Telegram::parse(&packet).unwrap();
        assert_eq!(telegram.rorg, Rorg::Vld);
        assert_eq!(&telegram.data[..], &[0x7E, 60]);
        assert_eq!(telegram.destination, Some(fan));
        module.reply(ReturnCode::Ok, &[], &[]).await;
    };
    let action = SetFanSpeedAction::new(60).unwrap();
    let (result, _) = tokio::join!(gateway.send_action(action, fan), module_side);
    assert!(result.unwrap().expect("module confirmed").is_empty());

    module.radio(Rorg::Vld, &[0x80, 0x32], fan).await;
    let change = loop {
        let change = next(&mut state_rx).await;
        if change.observable_uid == observable::FAN_SPEED {
            break change;
        }
    };
    assert_eq!(change.device_address, fan);
    assert_eq!(change.value, EepValue::Number(50.0));
    assert_eq!(change.unit.as_deref(), Some("%"));
}

#[tokio::test(start_paused = true)]
async fn test_cover_watchdog_through_gateway() {
    let (gateway, mut module) = setup();
    gateway.register_device(blind(), D2_05_00).await.unwrap();

    let (state_tx, mut state_rx) = mpsc::unbounded_channel::<StateChange>();
    gateway.on_state_change(move |change| {
        if change.observable_uid == observable::COVER_STATE {
            let _ = state_tx.send(change.clone());
        }
    });

    module.radio(Rorg::Vld, &[20, 0, 0, 0x04], blind()).await;
    module.radio(Rorg::Vld, &[50, 0, 0, 0x04], blind()).await;

    let closing = next(&mut state_rx).await;
    assert_eq!(closing.value, EepValue::Label("closing".into()));
    assert_eq!(closing.source, StateChangeSource::Telegram);

    let start = Instant::now();
    let stopped = next(&mut state_rx).await;
    assert_eq!(stopped.value, EepValue::Label("stopped".into()));
    assert_eq!(stopped.source, StateChangeSource::Timer);
    assert!(start.elapsed() >= Duration::from_secs(4));
}

#[tokio::test]
async fn test_teach_in_routed_and_answered() {
    let (gateway, mut module) = setup();
    let device = Address::from_u32(0x0510_2030);
    gateway.register_device(device, D2_05_00).await.unwrap();

    let (teach_tx, mut teach_rx) = mpsc::unbounded_channel();
    gateway.on_teach_in(move |t| {
        let _ = teach_tx.send(t.clone());
    });
    let (eep_tx, mut eep_rx) = mpsc::unbounded_channel();
    gateway.on_eep_message(None, move |m| {
        let _ = eep_tx.send(m.sender);
    });

    module
        .radio(Rorg::Ute, &[0xA0, 0xFF, 0x3E, 0x00, 0x01, 0x01, 0xD2], device)
        .await;
    let query: UteMessage = match next(&mut teach_rx).await {
        TeachIn::Ute(query) => query,
        other => panic!("unexpected teach-in {:?}", other),
    };
    assert_eq!(query.eep, EepId::new(0xD2, 0x01, 0x01));
    assert!(eep_rx.try_recv().is_err());

    let module_side = async {
        let telegram = Erp1Telegram::parse(&module.next_packet().await).unwrap();
        assert_eq!(&telegram.data[..], &[0x91, 0xFF, 0x3E, 0x00, 0x01, 0x01, 0xD2]);
        assert_eq!(telegram.sender, Address::from_u32(SENDER));
        assert_eq!(telegram.destination, Some(device));
        module.reply(ReturnCode::Ok, &[], &[]).await;
    };
    let (result, _) = tokio::join!(
        gateway.send_teach_in_response(&query, UteResponseType::AcceptedTeachIn),
        module_side
    );
    assert!(result.unwrap().is_some());
}

#[tokio::test]
async fn test_deregistered_device_is_new_again() {
    let (gateway, mut module) = setup();
    gateway.register_device(temperature_sensor(), A5_02_05).await.unwrap();
    assert!(gateway.deregister_device(temperature_sensor()).await.unwrap());
    assert!(!gateway.deregister_device(temperature_sensor()).await.unwrap());

    let (new_tx, mut new_rx) = mpsc::unbounded_channel();
    gateway.on_new_device(move |address| {
        let _ = new_tx.send(address);
    });
    let (eep_tx, mut eep_rx) = mpsc::unbounded_channel();
    gateway.on_eep_message(None, move |m| {
        let _ = eep_tx.send(m.sender);
    });

    module
        .radio(Rorg::Bs4, &[0x00, 0x00, 0x80, 0x08], temperature_sensor())
        .await;
    assert_eq!(next(&mut new_rx).await, temperature_sensor());
    assert!(eep_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_change_base_id_verified() {
    let (gateway, mut module) = setup();

    let module_side = async {
        assert_eq!(&module.next_packet().await.data[..], &[0x08]);
        module.reply(ReturnCode::Ok, &[0xFF, 0x80, 0x00, 0x00], &[0x0A]).await;

        assert_eq!(&module.next_packet().await.data[..], &[0x07, 0xFF, 0x80, 0x01, 0x00]);
        module.reply(ReturnCode::Ok, &[], &[]).await;

        assert_eq!(&module.next_packet().await.data[..], &[0x08]);
        module.reply(ReturnCode::Ok, &[0xFF, 0x80, 0x01, 0x00], &[0x09]).await;
    };
    let (result, _) = tokio::join!(gateway.change_base_id(0xFF80_0100, 0x7B), module_side);

    assert_eq!(result.unwrap().value(), 0xFF80_0100);
    assert_eq!(gateway.base_id_remaining_write_cycles().await.unwrap(), Some(9));
}

#[tokio::test]
async fn test_change_base_id_failures() {
    let (gateway, mut module) = setup();

    let result = gateway.change_base_id(0xFF80_0100, 0x00).await;
    assert!(matches!(
        result,
        Err(GatewayError::BaseIdChange(BaseIdChangeError::InvalidSafetyFlag(0)))
    ));
    let result = gateway.change_base_id(0xFF80_0101, 0x7B).await;
    assert!(matches!(
        result,
        Err(GatewayError::BaseIdChange(BaseIdChangeError::InvalidBaseId(_)))
    ));

    let module_side = async {
        module.next_packet().await;
        module.reply(ReturnCode::Ok, &[0xFF, 0x80, 0x00, 0x00], &[0x00]).await;
        module.next_packet().await;
        module.reply(ReturnCode::BaseIdMaxReached, &[], &[]).await;
    };
    let (result, _) = tokio::join!(gateway.change_base_id(0xFF80_0100, 0x7B), module_side);
    assert!(matches!(
        result,
        Err(GatewayError::BaseIdChange(BaseIdChangeError::Rejected(ReturnCode::BaseIdMaxReached)))
    ));

    let result = gateway.change_base_id(0xFF80_0000, 0x7B).await;
    assert!(matches!(
        result,
        Err(GatewayError::BaseIdChange(BaseIdChangeError::Unchanged(_)))
    ));
}

#[tokio::test]
async fn test_shutdown_stops_gateway() {
    let (gateway, _module) = setup();
    gateway.shutdown().await;
    let result = gateway.register_device(temperature_sensor(), A5_02_05).await;
    assert!(matches!(result, Err(GatewayError::ConnectionClosed)));
}

#[tokio::test]
async fn test_profile_registered_at_runtime() {
    let (host, module) = tokio::io::duplex(4096);
    let options = GatewayOptions {
        builtin_profiles: false,
        ..GatewayOptions::default()
    };
    let gateway = Gateway::start(host, options);
    let (reader, writer) = tokio::io::split(module);
    let mut module = Module {
        frames: FramedRead::new(reader, Esp3Codec),
        writer,
    };

    assert!(!gateway.register_device(temperature_sensor(), A5_02_05).await.unwrap());
    gateway
        .register_profile(enocean_gateway::profiles::find(A5_02_05).unwrap())
        .await
        .unwrap();

    let (eep_tx, mut eep_rx) = mpsc::unbounded_channel();
    gateway.on_eep_message(None, move |m| {
        let _ = eep_tx.send(m.eep_id);
    });
    module
        .radio(Rorg::Bs4, &[0x00, 0x00, 0x80, 0x08], temperature_sensor())
        .await;
    assert_eq!(next(&mut eep_rx).await, Some(A5_02_05));
}
