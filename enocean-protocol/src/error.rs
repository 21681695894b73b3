//! Error types for the EnOcean protocol stack.

use thiserror::Error;

use crate::action::ActionUid;
use crate::types::{PacketType, Rorg};

/// Errors raised when constructing or parsing an address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Value lies outside the unique-ID range.
    #[error("0x{0:08X} is not a unique ID (valid range 00:00:00:00 - FF:7F:FF:FF)")]
    NotUniqueId(u32),

    /// Value lies outside the base-ID range.
    #[error("0x{0:08X} is not a base ID (valid range FF:80:00:00 - FF:FF:FF:FE)")]
    NotBaseId(u32),

    /// A module base ID must be aligned to a block of 128 addresses.
    #[error("0x{0:08X} is not aligned to a base-ID block")]
    UnalignedBaseId(u32),

    /// The broadcast address was given where a device address is required.
    #[error("broadcast address is not a device address")]
    Broadcast,

    /// Textual form could not be parsed.
    #[error("invalid address string: {0:?}")]
    Malformed(String),

    /// Wrong number of address bytes.
    #[error("address needs 4 bytes, got {0}")]
    WrongLength(usize),
}

/// Structural errors while parsing ESP3 packets and the telegrams they carry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Packet is of a different type than the parser expects.
    #[error("unexpected packet type: expected {expected:?}, got {actual:?}")]
    UnexpectedPacketType {
        expected: PacketType,
        actual: PacketType,
    },

    /// Packet data is shorter than the minimum for its type.
    #[error("packet too short: need at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// First data byte is not a known RORG.
    #[error("unknown RORG: 0x{0:02X}")]
    UnknownRorg(u8),

    /// Payload length does not match the RORG's length table.
    #[error("{rorg:?} payload must be {expected} bytes, got {actual}")]
    PayloadLength {
        rorg: Rorg,
        expected: &'static str,
        actual: usize,
    },

    /// Telegram was expected to have a different RORG.
    #[error("unexpected RORG: expected {expected:?}, got {actual:?}")]
    UnexpectedRorg { expected: Rorg, actual: Rorg },

    /// Sender or destination address is invalid.
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    /// Bit range does not lie within the payload.
    #[error("invalid bit range: offset {offset}, size {size} in {bits}-bit payload")]
    BitRange { offset: usize, size: usize, bits: usize },

    /// Value does not fit in the addressed bit range.
    #[error("value {value} does not fit in {size} bits")]
    ValueTooWide { value: u64, size: usize },

    /// Scaling bounds are not ascending.
    #[error("scale_max ({max}) must be greater than scale_min ({min})")]
    InvalidScale { min: f64, max: f64 },

    /// A field of a fixed-format message has a value outside its enumeration.
    #[error("invalid {field} value: {value}")]
    InvalidField { field: &'static str, value: u64 },

    /// A packet section is longer than its ESP3 length field can express.
    #[error("{section} section of {len} bytes exceeds the ESP3 limit of {max}")]
    PacketTooLarge {
        section: &'static str,
        len: usize,
        max: usize,
    },

    /// A teach-in response can only be built for a teach-in query.
    #[error("teach-in message is not a query")]
    NotAQuery,
}

/// Semantic errors of the EEP decode/encode engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EepError {
    /// The command selector decoded to a code with no telegram layout.
    #[error("command 0x{0:X} is not supported by this profile")]
    UnsupportedCommand(u64),

    /// The profile has no encoder for the requested action.
    #[error("action {0:?} is not supported by this profile")]
    UnsupportedAction(ActionUid),

    /// Telegram RORG does not match the profile's RORG.
    #[error("profile expects RORG 0x{expected:02X}, telegram has 0x{actual:02X}")]
    RorgMismatch { expected: u8, actual: u8 },

    /// Profile RORG is not a known RORG, so nothing can be sent.
    #[error("profile RORG 0x{0:02X} is unknown")]
    UnknownRorg(u8),

    /// An encoded message referenced a field that the layout does not have.
    #[error("field {0:?} is not part of the telegram layout")]
    UnknownField(String),

    /// A command-dispatch encoder produced no message type.
    #[error("encoded message carries no message type")]
    MissingMessageType,

    /// Action parameter outside its permitted range.
    #[error("invalid {parameter}: {value} (allowed {allowed})")]
    InvalidParameter {
        parameter: &'static str,
        value: i64,
        allowed: &'static str,
    },

    /// Underlying bit access failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Return code carried in the first data byte of a RESPONSE packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    /// RET_OK.
    Ok,
    /// RET_ERROR.
    Error,
    /// RET_NOT_SUPPORTED.
    NotSupported,
    /// RET_WRONG_PARAM.
    WrongParam,
    /// RET_OPERATION_DENIED.
    OperationDenied,
    /// RET_LOCK_SET.
    LockSet,
    /// RET_BUFFER_TO_SMALL.
    BufferTooSmall,
    /// RET_NO_FREE_BUFFER.
    NoFreeBuffer,
    /// RET_FLASH_HW_ERROR.
    FlashHwError,
    /// Requested base ID lies outside FF:80:00:00 - FF:FF:FF:80.
    BaseIdOutOfRange,
    /// The base ID write-cycle budget is exhausted.
    BaseIdMaxReached,
    /// Any code not listed above.
    Other(u8),
}

impl From<u8> for ReturnCode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ReturnCode::Ok,
            0x01 => ReturnCode::Error,
            0x02 => ReturnCode::NotSupported,
            0x03 => ReturnCode::WrongParam,
            0x04 => ReturnCode::OperationDenied,
            0x05 => ReturnCode::LockSet,
            0x06 => ReturnCode::BufferTooSmall,
            0x07 => ReturnCode::NoFreeBuffer,
            0x82 => ReturnCode::FlashHwError,
            0x90 => ReturnCode::BaseIdOutOfRange,
            0x91 => ReturnCode::BaseIdMaxReached,
            other => ReturnCode::Other(other),
        }
    }
}

impl From<ReturnCode> for u8 {
    fn from(value: ReturnCode) -> Self {
        match value {
            ReturnCode::Ok => 0x00,
            ReturnCode::Error => 0x01,
            ReturnCode::NotSupported => 0x02,
            ReturnCode::WrongParam => 0x03,
            ReturnCode::OperationDenied => 0x04,
            ReturnCode::LockSet => 0x05,
            ReturnCode::BufferTooSmall => 0x06,
            ReturnCode::NoFreeBuffer => 0x07,
            ReturnCode::FlashHwError => 0x82,
            ReturnCode::BaseIdOutOfRange => 0x90,
            ReturnCode::BaseIdMaxReached => 0x91,
            ReturnCode::Other(code) => code,
        }
    }
}

impl ReturnCode {
    /// Returns true if this code indicates success.
    pub fn is_ok(self) -> bool {
        self == ReturnCode::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_code_roundtrip() {
        for raw in 0u8..=0xFF {
            let code = ReturnCode::from(raw);
            assert_eq!(u8::from(code), raw);
        }
        assert_eq!(ReturnCode::from(0x91), ReturnCode::BaseIdMaxReached);
        assert!(ReturnCode::from(0).is_ok());
        assert!(!ReturnCode::from(0x02).is_ok());
    }
}
