//! Capabilities project decoded EEP messages into device state changes.
//!
//! A capability is bound to one device address when the device is registered
//! and lives until the device is deregistered or the gateway stops. Messages
//! from other senders are filtered out before a capability sees them.

use std::sync::Arc;

use enocean_protocol::{Address, EepMessage};

use crate::state_change::StateSink;

pub mod cover;
pub mod metadata;
pub mod meter;
pub mod push_button;
pub mod scalar;

pub use cover::{CoverCapability, DEFAULT_WATCHDOG};
pub use metadata::MetaDataCapability;
pub use meter::MeterCapability;
pub use push_button::PushButtonCapability;
pub use scalar::ScalarCapability;

/// Per-device decoder of EEP messages.
pub trait Capability: Send {
    /// Device this capability is bound to.
    fn device_address(&self) -> Address;

    /// Feed a decoded message. Messages from other devices are ignored.
    fn decode(&mut self, message: &EepMessage) {
        if message.sender != Some(self.device_address()) {
            return;
        }
        self.decode_impl(message);
    }

    /// Handle a message known to come from this capability's device.
    fn decode_impl(&mut self, message: &EepMessage);
}

/// Settings handed to capability factories.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityOptions {
    pub cover_watchdog: std::time::Duration,
}

impl Default for CapabilityOptions {
    fn default() -> Self {
        Self {
            cover_watchdog: DEFAULT_WATCHDOG,
        }
    }
}

/// Creates a capability for a newly registered device.
pub type CapabilityFactory =
    Arc<dyn Fn(Address, StateSink, &CapabilityOptions) -> Box<dyn Capability> + Send + Sync>;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::state_change::{StateChange, StateSink};

    /// Sink that records every emitted change.
    pub fn collecting_sink() -> (StateSink, Arc<Mutex<Vec<StateChange>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&seen);
        let sink: StateSink = Arc::new(move |change| store.lock().push(change));
        (sink, seen)
    }
}
