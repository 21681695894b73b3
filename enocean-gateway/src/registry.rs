//! Device and profile registry.
//!
//! Owned by the gateway loop; all mutation goes through it.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use enocean_protocol::{Address, EepError, EepId, EepMessage, Erp1Telegram};

use crate::capability::{Capability, CapabilityOptions};
use crate::profiles::ProfileHandler;
use crate::state_change::StateSink;

struct DeviceEntry {
    eep: EepId,
    capabilities: Vec<Box<dyn Capability>>,
}

/// Known devices, profile handlers and the capabilities bound to them.
pub struct Registry {
    handlers: HashMap<EepId, ProfileHandler>,
    devices: HashMap<Address, DeviceEntry>,
    seen: HashSet<Address>,
    sink: StateSink,
    options: CapabilityOptions,
}

impl Registry {
    pub fn new(sink: StateSink, options: CapabilityOptions) -> Self {
        Self {
            handlers: HashMap::new(),
            devices: HashMap::new(),
            seen: HashSet::new(),
            sink,
            options,
        }
    }

    /// Add or replace the handler for a profile.
    ///
    /// Registered devices using the profile get fresh capabilities.
    pub fn register_profile(&mut self, handler: ProfileHandler) {
        let eep = handler.eep_id();
        for (address, device) in self.devices.iter_mut().filter(|(_, d)| d.eep == eep) {
            device.capabilities = handler.create_capabilities(*address, &self.sink, &self.options);
        }
        debug!("Registered profile handler {} ({})", eep, handler.specification.name());
        self.handlers.insert(eep, handler);
    }

    pub fn handler(&self, eep: EepId) -> Option<&ProfileHandler> {
        self.handlers.get(&eep)
    }

    /// Record the profile of a device, replacing any earlier registration.
    ///
    /// Returns whether a handler for the profile exists.
    pub fn register_device(&mut self, address: Address, eep: EepId) -> bool {
        let handler = self.handlers.get(&eep);
        let capabilities = handler
            .map(|h| h.create_capabilities(address, &self.sink, &self.options))
            .unwrap_or_default();
        info!(
            "Registered device {} as {} with {} capabilities",
            address,
            eep,
            capabilities.len()
        );
        self.devices.insert(address, DeviceEntry { eep, capabilities });
        handler.is_some()
    }

    /// Forget a device; its capabilities are dropped and its next telegram
    /// counts as a first sighting again.
    pub fn deregister_device(&mut self, address: Address) -> bool {
        self.seen.remove(&address);
        let removed = self.devices.remove(&address).is_some();
        if removed {
            info!("Deregistered device {}", address);
        }
        removed
    }

    pub fn device_eep(&self, address: Address) -> Option<EepId> {
        self.devices.get(&address).map(|d| d.eep)
    }

    pub fn is_registered(&self, address: Address) -> bool {
        self.devices.contains_key(&address)
    }

    /// True the first time an unregistered address is seen.
    pub fn first_sighting(&mut self, address: Address) -> bool {
        !self.devices.contains_key(&address) && self.seen.insert(address)
    }

    /// Decode a telegram from a registered device and feed its capabilities.
    ///
    /// Returns `None` when the sender is unknown or its profile has no handler.
    pub fn decode(&mut self, telegram: &Erp1Telegram) -> Option<Result<EepMessage, EepError>> {
        let device = self.devices.get_mut(&telegram.sender)?;
        let handler = self.handlers.get(&device.eep)?;
        let message = match handler.specification.decode(telegram) {
            Ok(message) => message,
            Err(e) => return Some(Err(e)),
        };
        for capability in &mut device.capabilities {
            capability.decode(&message);
        }
        Some(Ok(message))
    }
}
