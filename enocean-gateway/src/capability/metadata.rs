//! Per-telegram link metadata.

use chrono::{SecondsFormat, Utc};

use enocean_protocol::{Address, EepMessage, EepValue};

use super::Capability;
use crate::observable;
use crate::state_change::{StateChange, StateSink};

/// Reports signal strength and the time a device was last heard.
pub struct MetaDataCapability {
    device_address: Address,
    sink: StateSink,
}

impl MetaDataCapability {
    pub fn new(device_address: Address, sink: StateSink) -> Self {
        Self { device_address, sink }
    }
}

impl Capability for MetaDataCapability {
    fn device_address(&self) -> Address {
        self.device_address
    }

    fn decode_impl(&mut self, message: &EepMessage) {
        if let Some(rssi) = message.rssi {
            (self.sink)(
                StateChange::telegram(self.device_address, observable::RSSI, EepValue::Number(f64::from(rssi)))
                    .with_unit(Some("dBm".to_string())),
            );
        }
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        (self.sink)(StateChange::telegram(
            self.device_address,
            observable::LAST_SEEN,
            EepValue::Label(now),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::collecting_sink;

    #[test]
    fn test_rssi_and_last_seen() {
        let device = Address::from_u32(0x0100_0001);
        let (sink, seen) = collecting_sink();
        let mut capability = MetaDataCapability::new(device, sink);

        let mut message = EepMessage::new(Some(device), None);
        message.rssi = Some(-74);
        capability.decode(&message);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].observable_uid, observable::RSSI);
        assert_eq!(seen[0].value, EepValue::Number(-74.0));
        assert_eq!(seen[0].unit.as_deref(), Some("dBm"));
        assert_eq!(seen[1].observable_uid, observable::LAST_SEEN);
        assert!(seen[1].value.as_label().is_some_and(|ts| ts.ends_with('Z')));
    }

    #[test]
    fn test_without_rssi_reports_last_seen_only() {
        let device = Address::from_u32(0x0100_0001);
        let (sink, seen) = collecting_sink();
        let mut capability = MetaDataCapability::new(device, sink);
        capability.decode(&EepMessage::new(Some(device), None));
        capability.decode(&EepMessage::new(Some(Address::from_u32(7)), None));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].observable_uid, observable::LAST_SEEN);
    }
}
