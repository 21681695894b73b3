//! Listener registry and deferred callback dispatch.
//!
//! Callbacks never run while a packet is being processed. Processing only
//! queues them, and the gateway loop drains the queue once the packet has
//! been handled completely, so a callback cannot re-enter the loop.

use std::collections::VecDeque;
use std::sync::Arc;

use enocean_protocol::{Address, EepMessage, Erp1Telegram, Esp3Packet, ResponseTelegram, TeachIn};

use crate::state_change::StateChange;

pub type PacketCallback = Arc<dyn Fn(&Esp3Packet) + Send + Sync>;
pub type ResponseCallback = Arc<dyn Fn(&ResponseTelegram) + Send + Sync>;
pub type Erp1Callback = Arc<dyn Fn(&Erp1Telegram) + Send + Sync>;
pub type EepCallback = Arc<dyn Fn(&EepMessage) + Send + Sync>;
pub type TeachInCallback = Arc<dyn Fn(&TeachIn) + Send + Sync>;
pub type NewDeviceCallback = Arc<dyn Fn(Address) + Send + Sync>;
pub type StateCallback = Arc<dyn Fn(&StateChange) + Send + Sync>;

type Task = Box<dyn FnOnce() + Send>;

/// FIFO of callback invocations waiting to run.
#[derive(Default)]
pub struct DispatchQueue {
    tasks: VecDeque<Task>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, task: impl FnOnce() + Send + 'static) {
        self.tasks.push_back(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every queued task in order, returning how many ran.
    pub fn drain(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.tasks.pop_front() {
            task();
            ran += 1;
        }
        ran
    }
}

/// Callback that only fires for one sender when `address` is set.
#[derive(Clone)]
struct Filtered<C> {
    address: Option<Address>,
    callback: C,
}

impl<C> Filtered<C> {
    fn matches(&self, sender: Option<Address>) -> bool {
        self.address.map_or(true, |address| Some(address) == sender)
    }
}

/// Registered listeners, one list per event kind.
#[derive(Default)]
pub struct Listeners {
    packet: Vec<PacketCallback>,
    sent: Vec<PacketCallback>,
    response: Vec<ResponseCallback>,
    erp1: Vec<Filtered<Erp1Callback>>,
    eep: Vec<Filtered<EepCallback>>,
    teach_in: Vec<TeachInCallback>,
    new_device: Vec<NewDeviceCallback>,
    state: Vec<StateCallback>,
}

impl Listeners {
    pub fn add_packet(&mut self, callback: PacketCallback) {
        self.packet.push(callback);
    }

    pub fn add_sent(&mut self, callback: PacketCallback) {
        self.sent.push(callback);
    }

    pub fn add_response(&mut self, callback: ResponseCallback) {
        self.response.push(callback);
    }

    pub fn add_erp1(&mut self, address: Option<Address>, callback: Erp1Callback) {
        self.erp1.push(Filtered { address, callback });
    }

    pub fn add_eep(&mut self, address: Option<Address>, callback: EepCallback) {
        self.eep.push(Filtered { address, callback });
    }

    pub fn add_teach_in(&mut self, callback: TeachInCallback) {
        self.teach_in.push(callback);
    }

    pub fn add_new_device(&mut self, callback: NewDeviceCallback) {
        self.new_device.push(callback);
    }

    pub fn add_state(&mut self, callback: StateCallback) {
        self.state.push(callback);
    }

    pub fn queue_packet(&self, queue: &mut DispatchQueue, packet: &Esp3Packet) {
        queue_all(queue, &self.packet, packet);
    }

    pub fn queue_sent(&self, queue: &mut DispatchQueue, packet: &Esp3Packet) {
        queue_all(queue, &self.sent, packet);
    }

    pub fn queue_response(&self, queue: &mut DispatchQueue, response: &ResponseTelegram) {
        queue_all(queue, &self.response, response);
    }

    pub fn queue_erp1(&self, queue: &mut DispatchQueue, telegram: &Erp1Telegram) {
        let callbacks: Vec<_> = self
            .erp1
            .iter()
            .filter(|f| f.matches(Some(telegram.sender)))
            .map(|f| Arc::clone(&f.callback))
            .collect();
        queue_all(queue, &callbacks, telegram);
    }

    pub fn queue_eep(&self, queue: &mut DispatchQueue, message: &EepMessage) {
        let callbacks: Vec<_> = self
            .eep
            .iter()
            .filter(|f| f.matches(message.sender))
            .map(|f| Arc::clone(&f.callback))
            .collect();
        queue_all(queue, &callbacks, message);
    }

    pub fn queue_teach_in(&self, queue: &mut DispatchQueue, teach_in: &TeachIn) {
        queue_all(queue, &self.teach_in, teach_in);
    }

    pub fn queue_new_device(&self, queue: &mut DispatchQueue, address: Address) {
        for callback in &self.new_device {
            let callback = Arc::clone(callback);
            queue.defer(move || callback(address));
        }
    }

    pub fn queue_state(&self, queue: &mut DispatchQueue, change: &StateChange) {
        queue_all(queue, &self.state, change);
    }
}

fn queue_all<T>(queue: &mut DispatchQueue, callbacks: &[Arc<dyn Fn(&T) + Send + Sync>], event: &T)
where
    T: Clone + Send + Sync + 'static,
{
    if callbacks.is_empty() {
        return;
    }
    let event = Arc::new(event.clone());
    for callback in callbacks {
        let callback = Arc::clone(callback);
        let event = Arc::clone(&event);
        queue.defer(move || callback(event.as_ref()));
    }
}
