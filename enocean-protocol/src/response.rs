//! RESPONSE packets and the common commands whose replies they carry.

use std::fmt;

use bytes::Bytes;

use crate::address::{Address, BaseAddress, Eurid};
use crate::error::{AddressError, ProtocolError, ReturnCode};
use crate::types::{Esp3Packet, PacketType};

/// Safety value required before the base ID may be rewritten.
pub const BASE_ID_SAFETY_FLAG: u8 = 0x7B;

/// Common commands sent to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonCommand {
    /// CO_RD_VERSION: read firmware and chip identification.
    ReadVersion,
    /// CO_WR_IDBASE: write a new base ID.
    WriteIdBase(BaseAddress),
    /// CO_RD_IDBASE: read base ID and remaining write cycles.
    ReadIdBase,
}

impl CommonCommand {
    pub fn code(&self) -> u8 {
        match self {
            CommonCommand::ReadVersion => 0x03,
            CommonCommand::WriteIdBase(_) => 0x07,
            CommonCommand::ReadIdBase => 0x08,
        }
    }

    pub fn to_packet(&self) -> Esp3Packet {
        match self {
            CommonCommand::WriteIdBase(base) => Esp3Packet::common_command(self.code(), &base.value().to_be_bytes()),
            _ => Esp3Packet::common_command(self.code(), &[]),
        }
    }
}

/// Reply of the module to the most recent command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTelegram {
    pub return_code: ReturnCode,
    /// Data following the return code.
    pub response_data: Bytes,
    pub optional: Bytes,
}

impl ResponseTelegram {
    pub fn parse(packet: &Esp3Packet) -> Result<Self, ProtocolError> {
        if packet.packet_type != PacketType::Response {
            return Err(ProtocolError::UnexpectedPacketType {
                expected: PacketType::Response,
                actual: packet.packet_type,
            });
        }
        let Some(&code) = packet.data.first() else {
            return Err(ProtocolError::TooShort { expected: 1, actual: 0 });
        };
        Ok(Self {
            return_code: ReturnCode::from(code),
            response_data: packet.data.slice(1..),
            optional: packet.optional.clone(),
        })
    }

    /// Build a RESPONSE packet, as the module would send it.
    pub fn to_packet(&self) -> Esp3Packet {
        let mut data = Vec::with_capacity(1 + self.response_data.len());
        data.push(u8::from(self.return_code));
        data.extend_from_slice(&self.response_data);
        Esp3Packet::new(PacketType::Response, data, self.optional.clone())
    }

    fn require(&self, len: usize) -> Result<(), ProtocolError> {
        if self.response_data.len() < len {
            return Err(ProtocolError::TooShort {
                expected: len + 1,
                actual: self.response_data.len() + 1,
            });
        }
        Ok(())
    }
}

/// Four-part firmware or API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionIdentifier {
    pub main: u8,
    pub beta: u8,
    pub alpha: u8,
    pub build: u8,
}

impl fmt::Display for VersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.main, self.beta, self.alpha)?;
        if self.build != 0 {
            write!(f, "b{}", self.build)?;
        }
        Ok(())
    }
}

/// Reply to CO_RD_VERSION.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub app_version: VersionIdentifier,
    pub api_version: VersionIdentifier,
    pub eurid: Eurid,
    pub chip_version: u32,
    pub app_description: String,
}

impl VersionInfo {
    /// Length of the CO_RD_VERSION reply after the return code.
    pub const LEN: usize = 32;

    pub fn from_response(response: &ResponseTelegram) -> Result<Self, ProtocolError> {
        response.require(Self::LEN)?;
        let d = &response.response_data;
        let version = |i: usize| VersionIdentifier {
            main: d[i],
            beta: d[i + 1],
            alpha: d[i + 2],
            build: d[i + 3],
        };
        let eurid = Eurid::new(u32::from_be_bytes([d[8], d[9], d[10], d[11]]))?;
        let description: String = d[16..32]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect();
        Ok(Self {
            app_version: version(0),
            api_version: version(4),
            eurid,
            chip_version: u32::from_be_bytes([d[12], d[13], d[14], d[15]]),
            app_description: description,
        })
    }
}

/// Reply to CO_RD_IDBASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseIdInfo {
    pub base_id: BaseAddress,
    pub remaining_write_cycles: Option<u8>,
}

impl BaseIdInfo {
    pub fn from_response(response: &ResponseTelegram) -> Result<Self, ProtocolError> {
        response.require(4)?;
        let d = &response.response_data;
        let base_id = match Address::from_bytes(&d[..4])? {
            Address::Base(base) => base,
            other => return Err(AddressError::NotBaseId(other.value()).into()),
        };
        Ok(Self {
            base_id,
            remaining_write_cycles: response.optional.first().copied(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(data: &[u8], optional: &[u8]) -> ResponseTelegram {
        ResponseTelegram::parse(&Esp3Packet::new(PacketType::Response, data.to_vec(), optional.to_vec())).unwrap()
    }

    #[test]
    fn test_command_packets() {
        assert_eq!(&CommonCommand::ReadVersion.to_packet().data[..], &[0x03]);
        assert_eq!(&CommonCommand::ReadIdBase.to_packet().data[..], &[0x08]);
        let base = BaseAddress::module_base(0xFF80_0080).unwrap();
        let packet = CommonCommand::WriteIdBase(base).to_packet();
        assert_eq!(packet.packet_type, PacketType::CommonCommand);
        assert_eq!(&packet.data[..], &[0x07, 0xFF, 0x80, 0x00, 0x80]);
    }

    #[test]
    fn test_parse_response() {
        let parsed = response(&[0x91], &[]);
        assert_eq!(parsed.return_code, ReturnCode::BaseIdMaxReached);
        assert!(parsed.response_data.is_empty());

        let empty = Esp3Packet::new(PacketType::Response, Bytes::new(), Bytes::new());
        assert!(matches!(ResponseTelegram::parse(&empty), Err(ProtocolError::TooShort { .. })));
    }

    #[test]
    fn test_base_id_info() {
        let info = BaseIdInfo::from_response(&response(&[0x00, 0xFF, 0x9A, 0x00, 0x00], &[0x0A])).unwrap();
        assert_eq!(info.base_id.value(), 0xFF9A_0000);
        assert_eq!(info.remaining_write_cycles, Some(10));

        assert!(BaseIdInfo::from_response(&response(&[0x00, 0x01, 0x02, 0x03, 0x04], &[])).is_err());
        assert!(BaseIdInfo::from_response(&response(&[0x00, 0xFF], &[])).is_err());
    }

    #[test]
    fn test_version_info() {
        let mut data = vec![0x00, 2, 11, 1, 0, 2, 7, 1, 3, 0x01, 0x8A, 0x2B, 0x3C, 0x45, 0x00, 0x01, 0x03];
        let mut description = b"GATEWAYCTRL".to_vec();
        description.resize(16, 0);
        data.extend_from_slice(&description);

        let info = VersionInfo::from_response(&response(&data, &[])).unwrap();
        assert_eq!(info.app_version.to_string(), "2.11.1");
        assert_eq!(info.api_version.to_string(), "2.7.1b3");
        assert_eq!(info.eurid.value(), 0x018A_2B3C);
        assert_eq!(info.chip_version, 0x4500_0103);
        assert_eq!(info.app_description, "GATEWAYCTRL");

        assert!(VersionInfo::from_response(&response(&data[..20], &[])).is_err());
    }
}
