//! Generic capability for one observable value.

use enocean_protocol::{Address, EepMessage};

use super::Capability;
use crate::state_change::{StateChange, StateSink};

/// Emits a state change whenever its observable is present in a message.
///
/// Works with any profile whose fields carry the observable UID.
pub struct ScalarCapability {
    device_address: Address,
    observable_uid: &'static str,
    sink: StateSink,
}

impl ScalarCapability {
    pub fn new(device_address: Address, observable_uid: &'static str, sink: StateSink) -> Self {
        Self {
            device_address,
            observable_uid,
            sink,
        }
    }
}

impl Capability for ScalarCapability {
    fn device_address(&self) -> Address {
        self.device_address
    }

    fn decode_impl(&mut self, message: &EepMessage) {
        let Some(entity) = message.entities.get(self.observable_uid) else {
            return;
        };
        let Some(value) = entity.value.clone() else {
            return;
        };

        (self.sink)(
            StateChange::telegram(self.device_address, self.observable_uid, value).with_unit(entity.unit.clone()),
        );
    }
}
