//! Packet and telegram type definitions shared by the ESP3 and ERP1 layers.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Synchronization byte that opens every ESP3 frame.
pub const SYNC_BYTE: u8 = 0x55;

/// ESP3 packet type carried in the fifth header byte.
///
/// Codes without a dedicated variant are preserved in [`PacketType::Other`]
/// so that every frame round-trips unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketType {
    /// ERP1 radio telegram.
    RadioErp1,
    /// Reply to a previously sent command.
    Response,
    /// Radio sub-telegram.
    RadioSubTel,
    /// Event from the module.
    Event,
    /// Common command addressed to the module.
    CommonCommand,
    /// Smart Acknowledge command.
    SmartAckCommand,
    /// Remote management command.
    RemoteManCommand,
    /// Radio message (chained payload).
    RadioMessage,
    /// ERP2 radio telegram.
    RadioErp2,
    /// Configuration command.
    Config,
    /// Command accepted notification.
    CommandAccepted,
    /// IEEE 802.15.4 raw packet.
    Radio802_15_4,
    /// 2.4 GHz command.
    Command2_4,
    /// Any code not listed above.
    Other(u8),
}

impl From<u8> for PacketType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => PacketType::RadioErp1,
            0x02 => PacketType::Response,
            0x03 => PacketType::RadioSubTel,
            0x04 => PacketType::Event,
            0x05 => PacketType::CommonCommand,
            0x06 => PacketType::SmartAckCommand,
            0x07 => PacketType::RemoteManCommand,
            0x09 => PacketType::RadioMessage,
            0x0A => PacketType::RadioErp2,
            0x0B => PacketType::Config,
            0x0C => PacketType::CommandAccepted,
            0x10 => PacketType::Radio802_15_4,
            0x11 => PacketType::Command2_4,
            other => PacketType::Other(other),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(value: PacketType) -> Self {
        match value {
            PacketType::RadioErp1 => 0x01,
            PacketType::Response => 0x02,
            PacketType::RadioSubTel => 0x03,
            PacketType::Event => 0x04,
            PacketType::CommonCommand => 0x05,
            PacketType::SmartAckCommand => 0x06,
            PacketType::RemoteManCommand => 0x07,
            PacketType::RadioMessage => 0x09,
            PacketType::RadioErp2 => 0x0A,
            PacketType::Config => 0x0B,
            PacketType::CommandAccepted => 0x0C,
            PacketType::Radio802_15_4 => 0x10,
            PacketType::Command2_4 => 0x11,
            PacketType::Other(code) => code,
        }
    }
}

/// Radio telegram organization: the first data byte of an ERP1 telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rorg {
    /// Repeated switch communication.
    Rps = 0xF6,
    /// 1-byte communication.
    Bs1 = 0xD5,
    /// 4-byte communication.
    Bs4 = 0xA5,
    /// Variable-length data.
    Vld = 0xD2,
    /// Universal teach-in.
    Ute = 0xD4,
    /// Manufacturer-specific communication.
    Msc = 0xD1,
    /// Addressing destination telegram.
    Adt = 0xA6,
}

impl TryFrom<u8> for Rorg {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0xF6 => Ok(Rorg::Rps),
            0xD5 => Ok(Rorg::Bs1),
            0xA5 => Ok(Rorg::Bs4),
            0xD2 => Ok(Rorg::Vld),
            0xD4 => Ok(Rorg::Ute),
            0xD1 => Ok(Rorg::Msc),
            0xA6 => Ok(Rorg::Adt),
            other => Err(other),
        }
    }
}

impl From<Rorg> for u8 {
    fn from(value: Rorg) -> Self {
        value as u8
    }
}

impl Rorg {
    /// Permitted telegram-data length range for this RORG, if it has one.
    ///
    /// UTE and ADT carry no length constraint at the ERP1 level.
    pub fn payload_len_range(self) -> Option<(usize, usize)> {
        match self {
            Rorg::Rps | Rorg::Bs1 => Some((1, 1)),
            Rorg::Bs4 => Some((4, 4)),
            Rorg::Vld | Rorg::Msc => Some((1, 14)),
            Rorg::Ute | Rorg::Adt => None,
        }
    }

    /// Human-readable description of [`Rorg::payload_len_range`].
    pub(crate) fn payload_len_text(self) -> &'static str {
        match self {
            Rorg::Rps | Rorg::Bs1 => "1",
            Rorg::Bs4 => "4",
            Rorg::Vld | Rorg::Msc => "1-14",
            Rorg::Ute | Rorg::Adt => "any",
        }
    }
}

/// A framed ESP3 packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Esp3Packet {
    /// Packet type.
    pub packet_type: PacketType,
    /// Data section.
    pub data: Bytes,
    /// Optional section.
    pub optional: Bytes,
}

impl Esp3Packet {
    /// Create a packet from its parts.
    pub fn new(packet_type: PacketType, data: impl Into<Bytes>, optional: impl Into<Bytes>) -> Self {
        Self {
            packet_type,
            data: data.into(),
            optional: optional.into(),
        }
    }

    /// Create a COMMON_COMMAND packet with the given command code and arguments.
    pub fn common_command(code: u8, args: &[u8]) -> Self {
        let mut data = Vec::with_capacity(1 + args.len());
        data.push(code);
        data.extend_from_slice(args);
        Self::new(PacketType::CommonCommand, data, Bytes::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_type_preserves_unknown_codes() {
        for raw in 0u8..=0xFF {
            assert_eq!(u8::from(PacketType::from(raw)), raw);
        }
        assert_eq!(PacketType::from(0x01), PacketType::RadioErp1);
        assert_eq!(PacketType::from(0x08), PacketType::Other(0x08));
    }

    #[test]
    fn test_rorg_conversion() {
        assert_eq!(Rorg::try_from(0xA5), Ok(Rorg::Bs4));
        assert_eq!(Rorg::try_from(0xF6), Ok(Rorg::Rps));
        assert_eq!(Rorg::try_from(0x42), Err(0x42));
        assert_eq!(u8::from(Rorg::Vld), 0xD2);
        assert_eq!(Rorg::Ute.payload_len_range(), None);
        assert_eq!(Rorg::Msc.payload_len_range(), Some((1, 14)));
    }

    #[test]
    fn test_common_command_layout() {
        let packet = Esp3Packet::common_command(0x07, &[0xFF, 0x80, 0x00, 0x00]);
        assert_eq!(packet.packet_type, PacketType::CommonCommand);
        assert_eq!(&packet.data[..], &[0x07, 0xFF, 0x80, 0x00, 0x00]);
        assert!(packet.optional.is_empty());
    }
}
