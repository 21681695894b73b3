//! Command/response correlator and telegram fan-out.
//!
//! The ESP3 link carries no request identifiers, so only one request may be
//! outstanding: the next RESPONSE packet is taken as the answer to it. A
//! single background task owns the transport, the device registry and all
//! capability state; [`Gateway`] talks to it over a command channel.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

use enocean_protocol::{
    frame_len, Action, Address, BaseAddress, BaseIdInfo, CommonCommand, EepId, EepMessage, Erp1Telegram,
    Esp3Packet, Eurid, PacketType, ResponseTelegram, TeachIn, UteMessage, UteResponseType, VersionInfo,
    BASE_ID_SAFETY_FLAG,
};

use crate::capability::CapabilityOptions;
use crate::codec::Esp3Codec;
use crate::dispatch::{DispatchQueue, Listeners};
use crate::error::{BaseIdChangeError, GatewayError};
use crate::observable;
use crate::profiles::{self, ProfileHandler};
use crate::registry::Registry;
use crate::state_change::{StateChange, StateSink};

/// Time the module has to answer a command.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub response_timeout: Duration,
    pub command_queue_depth: usize,
    /// Sender of outbound telegrams; falls back to the base ID, then the EURID.
    pub sender_address: Option<Address>,
    pub capabilities: CapabilityOptions,
    /// Register the built-in profile catalog on start.
    pub builtin_profiles: bool,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            response_timeout: RESPONSE_TIMEOUT,
            command_queue_depth: 32,
            sender_address: None,
            capabilities: CapabilityOptions::default(),
            builtin_profiles: true,
        }
    }
}

struct Encoded {
    packet: Esp3Packet,
    changes: Vec<StateChange>,
}

enum Command {
    Send {
        packet: Esp3Packet,
        written: oneshot::Sender<Result<(), GatewayError>>,
        response: oneshot::Sender<ResponseTelegram>,
    },
    Encode {
        action: Action,
        sender: Address,
        destination: Address,
        reply: oneshot::Sender<Result<Encoded, GatewayError>>,
    },
    RegisterDevice {
        address: Address,
        eep: EepId,
        reply: oneshot::Sender<bool>,
    },
    DeregisterDevice {
        address: Address,
        reply: oneshot::Sender<bool>,
    },
    RegisterProfile {
        handler: ProfileHandler,
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Handle to a running gateway.
pub struct Gateway {
    commands: mpsc::Sender<Command>,
    listeners: Arc<Mutex<Listeners>>,
    /// Held for the whole request/response exchange.
    send_lock: tokio::sync::Mutex<()>,
    response_timeout: Duration,
    sender_address: Option<Address>,
    version: Mutex<Option<VersionInfo>>,
    base_id: Mutex<Option<BaseIdInfo>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Gateway {
    /// Start the gateway on an open transport.
    pub fn start<T>(transport: T, options: GatewayOptions) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(transport);
        let (cmd_tx, cmd_rx) = mpsc::channel(options.command_queue_depth.max(1));
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        let listeners = Arc::new(Mutex::new(Listeners::default()));

        let sink: StateSink = Arc::new(move |change| {
            // only fails once the loop has stopped
            let _ = state_tx.send(change);
        });
        let mut registry = Registry::new(sink, options.capabilities);
        if options.builtin_profiles {
            for handler in profiles::catalog() {
                registry.register_profile(handler);
            }
        }

        let event_loop = EventLoop {
            registry,
            listeners: Arc::clone(&listeners),
            queue: DispatchQueue::new(),
            pending: None,
        };
        let frames = FramedRead::new(reader, Esp3Codec);
        let sink = FramedWrite::new(writer, Esp3Codec);
        let task = tokio::spawn(event_loop.run(frames, sink, cmd_rx, state_rx));
        info!("Gateway started");

        Self {
            commands: cmd_tx,
            listeners,
            send_lock: tokio::sync::Mutex::new(()),
            response_timeout: options.response_timeout,
            sender_address: options.sender_address,
            version: Mutex::new(None),
            base_id: Mutex::new(None),
            task: Mutex::new(Some(task)),
        }
    }

    async fn request<T>(&self, command: Command, reply: oneshot::Receiver<T>) -> Result<T, GatewayError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| GatewayError::ConnectionClosed)?;
        reply.await.map_err(|_| GatewayError::ConnectionClosed)
    }

    /// Transmit a packet and wait for the module's RESPONSE.
    ///
    /// Returns `Ok(None)` when no response arrives within the timeout.
    /// Packets too large for an ESP3 frame are rejected before anything is written.
    pub async fn send(&self, packet: Esp3Packet) -> Result<Option<ResponseTelegram>, GatewayError> {
        frame_len(&packet)?;
        let _guard = self.send_lock.lock().await;

        let (written_tx, written_rx) = oneshot::channel();
        let (response_tx, response_rx) = oneshot::channel();
        let command = Command::Send {
            packet,
            written: written_tx,
            response: response_tx,
        };
        self.request(command, written_rx).await??;

        match tokio::time::timeout(self.response_timeout, response_rx).await {
            Ok(Ok(response)) => Ok(Some(response)),
            Ok(Err(_)) => Err(GatewayError::ConnectionClosed),
            Err(_) => {
                warn!("No response within {:?}", self.response_timeout);
                Ok(None)
            }
        }
    }

    /// Send a packet and turn a failure code into an error.
    async fn send_checked(&self, packet: Esp3Packet) -> Result<Option<ResponseTelegram>, GatewayError> {
        match self.send(packet).await? {
            Some(response) if response.return_code.is_ok() => Ok(Some(response)),
            Some(response) => Err(GatewayError::CommandFailed {
                code: response.return_code,
            }),
            None => Ok(None),
        }
    }

    /// Sender address used for outbound telegrams.
    pub fn sender_address(&self) -> Address {
        if let Some(address) = self.sender_address {
            return address;
        }
        let base_id = self.base_id.lock().map(|info| info.base_id);
        if let Some(base_id) = base_id {
            return base_id.into();
        }
        let eurid = self.version.lock().as_ref().map(|info| info.eurid);
        eurid.map_or(Address::from_u32(0), Address::from)
    }

    /// Encode `action` for a registered device and send it.
    ///
    /// On success returns the state the device was commanded into; `Ok(None)`
    /// means the module did not confirm the transmission in time.
    pub async fn send_action(
        &self,
        action: impl Into<Action>,
        destination: Address,
    ) -> Result<Option<Vec<StateChange>>, GatewayError> {
        let (reply, reply_rx) = oneshot::channel();
        let command = Command::Encode {
            action: action.into(),
            sender: self.sender_address(),
            destination,
            reply,
        };
        let encoded = self.request(command, reply_rx).await??;
        Ok(self
            .send_checked(encoded.packet)
            .await?
            .map(|_| encoded.changes))
    }

    /// Answer a UTE teach-in query.
    pub async fn send_teach_in_response(
        &self,
        query: &UteMessage,
        response: UteResponseType,
    ) -> Result<Option<ResponseTelegram>, GatewayError> {
        let reply = query.response_for_query(response, self.sender_address())?;
        let telegram = reply.to_erp1()?;
        self.send_checked(telegram.to_packet()).await
    }

    /// Register a device; returns whether its profile has a handler.
    pub async fn register_device(&self, address: Address, eep: EepId) -> Result<bool, GatewayError> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(Command::RegisterDevice { address, eep, reply }, reply_rx)
            .await
    }

    /// Forget a device and drop its capabilities.
    pub async fn deregister_device(&self, address: Address) -> Result<bool, GatewayError> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(Command::DeregisterDevice { address, reply }, reply_rx)
            .await
    }

    /// Add or replace a profile handler.
    pub async fn register_profile(&self, handler: ProfileHandler) -> Result<(), GatewayError> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(Command::RegisterProfile { handler, reply }, reply_rx)
            .await
    }

    pub fn on_packet(&self, callback: impl Fn(&Esp3Packet) + Send + Sync + 'static) {
        self.listeners.lock().add_packet(Arc::new(callback));
    }

    /// Called for every packet written to the module.
    pub fn on_sent(&self, callback: impl Fn(&Esp3Packet) + Send + Sync + 'static) {
        self.listeners.lock().add_sent(Arc::new(callback));
    }

    pub fn on_response(&self, callback: impl Fn(&ResponseTelegram) + Send + Sync + 'static) {
        self.listeners.lock().add_response(Arc::new(callback));
    }

    /// Radio telegrams, optionally only those sent by `address`.
    pub fn on_erp1(&self, address: Option<Address>, callback: impl Fn(&Erp1Telegram) + Send + Sync + 'static) {
        self.listeners.lock().add_erp1(address, Arc::new(callback));
    }

    /// Decoded messages of registered devices, optionally only from `address`.
    pub fn on_eep_message(
        &self,
        address: Option<Address>,
        callback: impl Fn(&EepMessage) + Send + Sync + 'static,
    ) {
        self.listeners.lock().add_eep(address, Arc::new(callback));
    }

    pub fn on_teach_in(&self, callback: impl Fn(&TeachIn) + Send + Sync + 'static) {
        self.listeners.lock().add_teach_in(Arc::new(callback));
    }

    /// Called once per unregistered sender.
    pub fn on_new_device(&self, callback: impl Fn(Address) + Send + Sync + 'static) {
        self.listeners.lock().add_new_device(Arc::new(callback));
    }

    pub fn on_state_change(&self, callback: impl Fn(&StateChange) + Send + Sync + 'static) {
        self.listeners.lock().add_state(Arc::new(callback));
    }

    /// Module version information, read once and cached.
    pub async fn version_info(&self) -> Result<Option<VersionInfo>, GatewayError> {
        let cached = self.version.lock().clone();
        if cached.is_some() {
            return Ok(cached);
        }
        let Some(response) = self.send_checked(CommonCommand::ReadVersion.to_packet()).await? else {
            return Ok(None);
        };
        let info = VersionInfo::from_response(&response)?;
        info!(
            "Module {} app {} api {}",
            info.app_description, info.app_version, info.api_version
        );
        *self.version.lock() = Some(info.clone());
        Ok(Some(info))
    }

    /// Unique ID of the module's chip.
    pub async fn eurid(&self) -> Result<Option<Eurid>, GatewayError> {
        Ok(self.version_info().await?.map(|info| info.eurid))
    }

    async fn base_id_info(&self) -> Result<Option<BaseIdInfo>, GatewayError> {
        let cached = *self.base_id.lock();
        if cached.is_some() {
            return Ok(cached);
        }
        let Some(response) = self.send_checked(CommonCommand::ReadIdBase.to_packet()).await? else {
            return Ok(None);
        };
        let info = BaseIdInfo::from_response(&response)?;
        *self.base_id.lock() = Some(info);
        Ok(Some(info))
    }

    pub async fn base_id(&self) -> Result<Option<BaseAddress>, GatewayError> {
        Ok(self.base_id_info().await?.map(|info| info.base_id))
    }

    /// How many more times the base ID may be changed, if the module says.
    pub async fn base_id_remaining_write_cycles(&self) -> Result<Option<u8>, GatewayError> {
        Ok(self
            .base_id_info()
            .await?
            .and_then(|info| info.remaining_write_cycles))
    }

    /// Change the module's base ID and verify the change by reading it back.
    ///
    /// `safety_flag` must be 0x7B. Base IDs can only be written a limited
    /// number of times.
    pub async fn change_base_id(&self, new_base_id: u32, safety_flag: u8) -> Result<BaseAddress, GatewayError> {
        if safety_flag != BASE_ID_SAFETY_FLAG {
            return Err(BaseIdChangeError::InvalidSafetyFlag(safety_flag).into());
        }
        let requested = BaseAddress::module_base(new_base_id).map_err(BaseIdChangeError::from)?;

        let previous = self.base_id().await?;
        if previous == Some(requested) {
            return Err(BaseIdChangeError::Unchanged(requested).into());
        }

        match self.send(CommonCommand::WriteIdBase(requested).to_packet()).await? {
            Some(response) if !response.return_code.is_ok() => {
                return Err(BaseIdChangeError::Rejected(response.return_code).into());
            }
            Some(_) => {}
            None => warn!("Base ID write was not acknowledged, verifying"),
        }

        *self.base_id.lock() = None;
        let reported = self.base_id().await?;
        match reported {
            Some(base_id) if base_id == requested => {
                info!("Base ID changed to {}", base_id);
                Ok(base_id)
            }
            Some(base_id) if Some(base_id) == previous => Err(BaseIdChangeError::NotApplied(base_id).into()),
            reported => Err(BaseIdChangeError::Unexpected { requested, reported }.into()),
        }
    }

    /// Stop the background task and drop all device state.
    pub async fn shutdown(&self) {
        // the loop may already be gone
        let _ = self.commands.send(Command::Shutdown).await;
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Gateway task ended abnormally: {}", e);
            }
        }
    }
}

struct EventLoop {
    registry: Registry,
    listeners: Arc<Mutex<Listeners>>,
    queue: DispatchQueue,
    pending: Option<oneshot::Sender<ResponseTelegram>>,
}

impl EventLoop {
    async fn run<R, W>(
        mut self,
        mut frames: FramedRead<R, Esp3Codec>,
        mut sink: FramedWrite<W, Esp3Codec>,
        mut commands: mpsc::Receiver<Command>,
        mut state_rx: mpsc::UnboundedReceiver<StateChange>,
    ) where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            tokio::select! {
                frame = frames.next() => match frame {
                    Some(Ok(packet)) => self.process_packet(packet),
                    Some(Err(e)) => {
                        warn!("Transport read failed: {}", e);
                        break;
                    }
                    None => {
                        info!("Transport closed");
                        break;
                    }
                },

                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => {
                        info!("Gateway shutting down");
                        break;
                    }
                    Some(command) => self.handle_command(command, &mut sink).await,
                },

                Some(change) = state_rx.recv() => {
                    self.listeners.lock().queue_state(&mut self.queue, &change);
                }
            }

            while let Ok(change) = state_rx.try_recv() {
                self.listeners.lock().queue_state(&mut self.queue, &change);
            }
            self.queue.drain();
        }
    }

    fn process_packet(&mut self, packet: Esp3Packet) {
        let listeners = Arc::clone(&self.listeners);
        let listeners = listeners.lock();
        listeners.queue_packet(&mut self.queue, &packet);

        match packet.packet_type {
            PacketType::Response => match ResponseTelegram::parse(&packet) {
                Ok(response) => {
                    listeners.queue_response(&mut self.queue, &response);
                    match self.pending.take() {
                        Some(waiter) => {
                            if waiter.send(response).is_err() {
                                debug!("Response arrived after its request timed out");
                            }
                        }
                        None => debug!("Unsolicited response {:?}", response.return_code),
                    }
                }
                Err(e) => debug!("Dropping malformed response: {}", e),
            },
            PacketType::RadioErp1 => self.process_erp1(&packet, &listeners),
            other => trace!("Ignoring {:?} packet", other),
        }
    }

    fn process_erp1(&mut self, packet: &Esp3Packet, listeners: &Listeners) {
        let telegram = match Erp1Telegram::parse(packet) {
            Ok(telegram) => telegram,
            Err(e) => {
                debug!("Dropping radio telegram: {}", e);
                return;
            }
        };
        listeners.queue_erp1(&mut self.queue, &telegram);

        let sender = telegram.sender;
        if self.registry.first_sighting(sender) {
            info!("New device {}", sender);
            listeners.queue_new_device(&mut self.queue, sender);
        }

        match TeachIn::from_erp1(&telegram) {
            Ok(Some(teach_in)) => {
                info!("Teach-in from {} for {:?}", sender, teach_in.eep());
                listeners.queue_teach_in(&mut self.queue, &teach_in);
                return;
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Malformed teach-in from {}: {}", sender, e);
                return;
            }
        }

        match self.registry.decode(&telegram) {
            Some(Ok(message)) => listeners.queue_eep(&mut self.queue, &message),
            Some(Err(e)) => debug!("Cannot decode telegram from {}: {}", sender, e),
            None => trace!("No profile for {}", sender),
        }
    }

    async fn handle_command<W>(&mut self, command: Command, sink: &mut FramedWrite<W, Esp3Codec>)
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            Command::Send {
                packet,
                written,
                response,
            } => {
                trace!("Sending {:?} packet", packet.packet_type);
                self.pending = Some(response);
                let result = sink.send(packet.clone()).await.map_err(GatewayError::from);
                match &result {
                    Ok(()) => self.listeners.lock().queue_sent(&mut self.queue, &packet),
                    Err(e) => {
                        warn!("Write failed: {}", e);
                        self.pending = None;
                    }
                }
                let _ = written.send(result);
            }
            Command::Encode {
                action,
                sender,
                destination,
                reply,
            } => {
                let _ = reply.send(self.encode(&action, sender, destination));
            }
            Command::RegisterDevice { address, eep, reply } => {
                let _ = reply.send(self.registry.register_device(address, eep));
            }
            Command::DeregisterDevice { address, reply } => {
                let _ = reply.send(self.registry.deregister_device(address));
            }
            Command::RegisterProfile { handler, reply } => {
                self.registry.register_profile(handler);
                let _ = reply.send(());
            }
            Command::Shutdown => {}
        }
    }

    fn encode(&self, action: &Action, sender: Address, destination: Address) -> Result<Encoded, GatewayError> {
        let eep = self
            .registry
            .device_eep(destination)
            .ok_or(GatewayError::UnknownDevice(destination))?;
        let handler = self.registry.handler(eep).ok_or(GatewayError::NoProfile(eep))?;
        let (telegram, echoed) = handler.specification.encode(action, sender, destination)?;
        debug!("Encoded {:?} for {} as {}", action.uid(), destination, eep);

        let changes = echoed
            .entities
            .iter()
            .filter_map(|(uid, entity)| {
                let uid = observable::find(uid)?;
                let value = entity.value.clone()?;
                Some(StateChange::telegram(destination, uid, value).with_unit(entity.unit.clone()))
            })
            .collect();
        Ok(Encoded {
            packet: telegram.to_packet(),
            changes,
        })
    }
}
