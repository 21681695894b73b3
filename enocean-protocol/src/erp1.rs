//! ERP1 radio telegrams carried in RADIO_ERP1 packets.
//!
//! ```text
//! data:     | RORG | telegram data | sender (4) | status |
//! optional: | sub tel num | destination (4) | RSSI | security level |
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::address::Address;
use crate::bitfield;
use crate::error::ProtocolError;
use crate::types::{Esp3Packet, PacketType, Rorg};

/// RORG + sender + status.
pub const MIN_DATA_LEN: usize = 6;

/// Sub-telegram count used for outbound telegrams.
pub const SEND_SUB_TEL_NUM: u8 = 3;

/// Parsed ERP1 telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erp1Telegram {
    pub rorg: Rorg,
    /// Payload between the RORG byte and the sender address.
    pub data: Bytes,
    pub sender: Address,
    pub status: u8,
    pub destination: Option<Address>,
    pub sub_tel_num: Option<u8>,
    /// Raw RSSI byte; the signal strength is its negation in dBm.
    pub rssi: Option<u8>,
    pub sec_level: Option<u8>,
}

impl Erp1Telegram {
    /// Build an outbound telegram.
    pub fn new(rorg: Rorg, data: impl Into<Bytes>, sender: Address, destination: Address) -> Self {
        Self {
            rorg,
            data: data.into(),
            sender,
            status: 0,
            destination: Some(destination),
            sub_tel_num: None,
            rssi: None,
            sec_level: None,
        }
    }

    /// Parse the telegram out of a RADIO_ERP1 packet.
    pub fn parse(packet: &Esp3Packet) -> Result<Self, ProtocolError> {
        if packet.packet_type != PacketType::RadioErp1 {
            return Err(ProtocolError::UnexpectedPacketType {
                expected: PacketType::RadioErp1,
                actual: packet.packet_type,
            });
        }

        let data = &packet.data;
        if data.len() < MIN_DATA_LEN {
            return Err(ProtocolError::TooShort {
                expected: MIN_DATA_LEN,
                actual: data.len(),
            });
        }

        let rorg = Rorg::try_from(data[0]).map_err(ProtocolError::UnknownRorg)?;
        let payload_end = data.len() - 5;
        let payload = data.slice(1..payload_end);
        if let Some((min, max)) = rorg.payload_len_range() {
            if payload.len() < min || payload.len() > max {
                return Err(ProtocolError::PayloadLength {
                    rorg,
                    expected: rorg.payload_len_text(),
                    actual: payload.len(),
                });
            }
        }

        let sender = Address::device(u32::from_be_bytes([
            data[payload_end],
            data[payload_end + 1],
            data[payload_end + 2],
            data[payload_end + 3],
        ]))?;
        let status = data[payload_end + 4];

        let opt = &packet.optional;
        let sub_tel_num = opt.first().copied();
        let destination = if opt.len() > 4 {
            Some(Address::from_bytes(&opt[1..5])?)
        } else {
            None
        };
        let rssi = opt.get(5).copied();
        let sec_level = opt.get(6).copied();

        Ok(Self {
            rorg,
            data: payload,
            sender,
            status,
            destination,
            sub_tel_num,
            rssi,
            sec_level,
        })
    }

    /// Serialize into a RADIO_ERP1 packet ready to be framed.
    pub fn to_packet(&self) -> Esp3Packet {
        let mut data = BytesMut::with_capacity(MIN_DATA_LEN + self.data.len());
        data.put_u8(self.rorg.into());
        data.put_slice(&self.data);
        data.put_slice(&self.sender.to_bytes());
        data.put_u8(self.status);

        let mut optional = BytesMut::with_capacity(7);
        optional.put_u8(SEND_SUB_TEL_NUM);
        optional.put_slice(&self.destination.unwrap_or(Address::Broadcast).to_bytes());
        optional.put_u8(0xFF);
        optional.put_u8(0x00);

        Esp3Packet::new(PacketType::RadioErp1, data.freeze(), optional.freeze())
    }

    /// Read a bit field of the payload.
    pub fn raw_bits(&self, offset: usize, size: usize) -> Result<u64, ProtocolError> {
        bitfield::raw_bits(&self.data, offset, size)
    }

    /// Read a bit field and scale it onto `[lo, hi]`.
    pub fn scaled_value(&self, offset: usize, size: usize, lo: f64, hi: f64) -> Result<f64, ProtocolError> {
        bitfield::scaled_value(&self.data, offset, size, lo, hi)
    }

    /// Data byte in EnOcean numbering, where DB0 is the last payload byte.
    pub fn data_byte(&self, index: usize) -> Option<u8> {
        let len = self.data.len();
        if index < len {
            Some(self.data[len - 1 - index])
        } else {
            None
        }
    }

    /// Signal strength in dBm, when the module reported one.
    pub fn rssi_dbm(&self) -> Option<i16> {
        self.rssi.map(|raw| -i16::from(raw))
    }

    /// 1BS and 4BS telegrams with the LRN bit (DB0.3) cleared are teach-in requests.
    pub fn is_teach_in(&self) -> bool {
        match self.rorg {
            Rorg::Bs1 | Rorg::Bs4 => self.data_byte(0).map_or(false, |db0| db0 & 0x08 == 0),
            _ => false,
        }
    }
}

impl TryFrom<&Esp3Packet> for Erp1Telegram {
    type Error = ProtocolError;

    fn try_from(packet: &Esp3Packet) -> Result<Self, Self::Error> {
        Self::parse(packet)
    }
}
