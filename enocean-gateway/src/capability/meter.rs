//! Automated meter reading capability (A5-12-xx).

use enocean_protocol::{Address, EepMessage};

use super::Capability;
use crate::observable;
use crate::state_change::{StateChange, StateSink};

/// Splits a meter reading into cumulative energy or current power.
///
/// The `DT` field selects the meaning of the reading and `TI` carries the
/// tariff, reported as the channel.
pub struct MeterCapability {
    device_address: Address,
    sink: StateSink,
}

impl MeterCapability {
    pub fn new(device_address: Address, sink: StateSink) -> Self {
        Self { device_address, sink }
    }
}

impl Capability for MeterCapability {
    fn device_address(&self) -> Address {
        self.device_address
    }

    fn decode_impl(&mut self, message: &EepMessage) {
        let Some(reading) = message.entities.get(observable::METER_READING) else {
            return;
        };
        let Some(value) = reading.value.clone() else {
            return;
        };
        let observable_uid = match message.values.get("DT").map(|v| v.raw) {
            Some(0) => observable::ENERGY,
            Some(1) => observable::POWER,
            _ => return,
        };
        let tariff = message.values.get("TI").map(|v| v.raw);

        (self.sink)(
            StateChange::telegram(self.device_address, observable_uid, value)
                .with_unit(reading.unit.clone())
                .with_channel(tariff),
        );
    }
}
