//! EnOcean protocol stack without any runtime.
//!
//! This crate covers the byte-level and telegram-level parts of talking to an
//! EnOcean radio module: ESP3 framing, ERP1 radio telegrams, teach-in
//! messages, module responses, and a data-driven engine that decodes and
//! encodes EnOcean Equipment Profiles (EEP).
//!
//! # Frame Format
//!
//! ```text
//! +------+----------+---------+------+-------+--------+----------+-------+
//! | 0x55 | Data len | Opt len | Type | CRC8H |  Data  | Optional | CRC8D |
//! |      |  u16 BE  |   u8    |  u8  |       |        |          |       |
//! +------+----------+---------+------+-------+--------+----------+-------+
//! ```
//!
//! # Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use enocean_protocol::{decode_packet, encode_packet, Erp1Telegram, Esp3Packet, PacketType};
//!
//! let packet = Esp3Packet::new(
//!     PacketType::RadioErp1,
//!     vec![0xF6, 0x30, 0x00, 0x29, 0x89, 0x79, 0x30],
//!     vec![0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x4A, 0x00],
//! );
//! let mut buf = BytesMut::from(&encode_packet(&packet).unwrap()[..]);
//! let decoded = decode_packet(&mut buf).unwrap();
//!
//! let telegram = Erp1Telegram::parse(&decoded).unwrap();
//! assert_eq!(telegram.sender.to_string(), "00:29:89:79");
//! assert_eq!(telegram.rssi_dbm(), Some(-74));
//! ```

pub mod action;
pub mod address;
pub mod bitfield;
pub mod codec;
pub mod eep;
pub mod erp1;
pub mod error;
pub mod response;
pub mod teach_in;
pub mod types;

pub use action::{
    Action, ActionUid, ChannelAction, DimAction, LockMode, RepositioningMode, SetCoverPositionAction,
    SetFanSpeedAction, SwitchAction, ALL_CHANNELS, FAN_SPEED_AUTO, FAN_SPEED_DEFAULT, FAN_SPEED_NO_CHANGE,
};
pub use address::{Address, BaseAddress, Eurid};
pub use codec::{crc8, decode_all, decode_packet, encode_packet, encode_packet_into, frame_len, HEADER_SIZE};
pub use eep::{EepId, EepMessage, EepMessageValue, EepSpecification, EepValue, MessageType};
pub use erp1::Erp1Telegram;
pub use error::{AddressError, EepError, ProtocolError, ReturnCode};
pub use response::{
    BaseIdInfo, CommonCommand, ResponseTelegram, VersionIdentifier, VersionInfo, BASE_ID_SAFETY_FLAG,
};
pub use teach_in::{FourBsTeachIn, TeachIn, UteMessage, UteResponseType};
pub use types::{Esp3Packet, PacketType, Rorg, SYNC_BYTE};
