//! Rocker switch capability for F6-02-01.

use enocean_protocol::{Address, EepMessage, EepValue};

use super::Capability;
use crate::observable;
use crate::state_change::{StateChange, StateSink};

/// Label for a rocker data byte, `None` for combinations with no meaning.
pub fn button_label(data: u8) -> Option<&'static str> {
    match data {
        0x30 => Some("a0"),
        0x10 => Some("a1"),
        0x70 => Some("b0"),
        0x50 => Some("b1"),
        0x37 => Some("ab0"),
        0x15 => Some("ab1"),
        0x17 => Some("a1b0"),
        0x35 => Some("a0b1"),
        0x00 => Some("released"),
        _ => None,
    }
}

/// Emits which rocker buttons were pressed, or that all were released.
pub struct PushButtonCapability {
    device_address: Address,
    sink: StateSink,
}

impl PushButtonCapability {
    pub fn new(device_address: Address, sink: StateSink) -> Self {
        Self { device_address, sink }
    }
}

impl Capability for PushButtonCapability {
    fn device_address(&self) -> Address {
        self.device_address
    }

    fn decode_impl(&mut self, message: &EepMessage) {
        let raw = |id: &str| message.values.get(id).map(|v| v.raw);
        let (Some(r1), Some(eb), Some(r2), Some(sa)) = (raw("R1"), raw("EB"), raw("R2"), raw("SA")) else {
            return;
        };
        let data = ((r1 << 5) | (eb << 4) | (r2 << 1) | sa) as u8;
        match button_label(data) {
            Some(label) => (self.sink)(StateChange::telegram(
                self.device_address,
                observable::PUSH_BUTTON,
                EepValue::Label(label.to_string()),
            )),
            None => log::debug!("{}: unmapped rocker data 0x{:02X}", self.device_address, data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::collecting_sink;
    use enocean_protocol::EepMessageValue;

    fn rocker(sender: Address, data: u8) -> EepMessage {
        let mut message = EepMessage::new(Some(sender), None);
        for (id, raw) in [
            ("R1", u64::from(data >> 5)),
            ("EB", u64::from((data >> 4) & 1)),
            ("R2", u64::from((data >> 1) & 0x07)),
            ("SA", u64::from(data & 1)),
        ] {
            message.values.insert(id.to_string(), EepMessageValue::raw(raw));
        }
        message
    }

    #[test]
    fn test_labels() {
        let device = Address::from_u32(0x0029_8979);
        let (sink, seen) = collecting_sink();
        let mut capability = PushButtonCapability::new(device, sink);
        for data in [0x30, 0x70, 0x37, 0x17, 0x00, 0x42] {
            capability.decode(&rocker(device, data));
        }
        let labels: Vec<String> = seen.lock().iter().map(|c| c.value.to_string()).collect();
        assert_eq!(labels, vec!["a0", "b0", "ab0", "a1b0", "released"]);
    }

    #[test]
    fn test_other_sender_ignored() {
        let (sink, seen) = collecting_sink();
        let mut capability = PushButtonCapability::new(Address::from_u32(1), sink);
        capability.decode(&rocker(Address::from_u32(2), 0x30));
        assert!(seen.lock().is_empty());
    }
}
