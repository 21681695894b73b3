//! EnOcean 32-bit addresses.
//!
//! The address space is partitioned into factory-assigned unique IDs
//! (`00:00:00:00` to `FF:7F:FF:FF`), gateway-assigned base IDs
//! (`FF:80:00:00` to `FF:FF:FF:FE`) and the broadcast address
//! `FF:FF:FF:FF`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// Highest unique ID.
pub const EURID_MAX: u32 = 0xFF7F_FFFF;
/// Lowest base ID.
pub const BASE_ID_MIN: u32 = 0xFF80_0000;
/// Highest base ID.
pub const BASE_ID_MAX: u32 = 0xFFFF_FFFE;
/// Broadcast address.
pub const BROADCAST: u32 = 0xFFFF_FFFF;
/// A module's base ID range covers this many consecutive addresses.
pub const BASE_ID_BLOCK: u32 = 0x80;

/// A factory-assigned unique device ID (EURID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Eurid(u32);

impl Eurid {
    /// Validate `value` as a unique ID.
    pub fn new(value: u32) -> Result<Self, AddressError> {
        if value <= EURID_MAX {
            Ok(Self(value))
        } else {
            Err(AddressError::NotUniqueId(value))
        }
    }

    /// Numeric value.
    pub fn value(self) -> u32 {
        self.0
    }
}

/// A gateway-assigned base ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaseAddress(u32);

impl BaseAddress {
    /// Validate `value` as a base ID.
    pub fn new(value: u32) -> Result<Self, AddressError> {
        if (BASE_ID_MIN..=BASE_ID_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AddressError::NotBaseId(value))
        }
    }

    /// Validate `value` as the first address of a module's base ID block.
    pub fn module_base(value: u32) -> Result<Self, AddressError> {
        let base = Self::new(value)?;
        if value % BASE_ID_BLOCK != 0 {
            return Err(AddressError::UnalignedBaseId(value));
        }
        Ok(base)
    }

    /// Numeric value.
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Any EnOcean address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Address {
    /// Unique device ID.
    Eurid(Eurid),
    /// Base ID.
    Base(BaseAddress),
    /// Broadcast.
    Broadcast,
}

impl Address {
    /// Classify a raw 32-bit value. Every value belongs to exactly one subtype.
    pub fn from_u32(value: u32) -> Self {
        if value <= EURID_MAX {
            Address::Eurid(Eurid(value))
        } else if value == BROADCAST {
            Address::Broadcast
        } else {
            Address::Base(BaseAddress(value))
        }
    }

    /// Classify a value that must identify a single device.
    pub fn device(value: u32) -> Result<Self, AddressError> {
        match Self::from_u32(value) {
            Address::Broadcast => Err(AddressError::Broadcast),
            address => Ok(address),
        }
    }

    /// Read a big-endian address from exactly four bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let array: [u8; 4] = bytes
            .try_into()
            .map_err(|_| AddressError::WrongLength(bytes.len()))?;
        Ok(Self::from_u32(u32::from_be_bytes(array)))
    }

    /// Numeric value.
    pub fn value(self) -> u32 {
        match self {
            Address::Eurid(eurid) => eurid.0,
            Address::Base(base) => base.0,
            Address::Broadcast => BROADCAST,
        }
    }

    /// Big-endian byte form.
    pub fn to_bytes(self) -> [u8; 4] {
        self.value().to_be_bytes()
    }

    pub fn is_broadcast(self) -> bool {
        matches!(self, Address::Broadcast)
    }
}

impl From<Eurid> for Address {
    fn from(value: Eurid) -> Self {
        Address::Eurid(value)
    }
}

impl From<BaseAddress> for Address {
    fn from(value: BaseAddress) -> Self {
        Address::Base(value)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.to_bytes();
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d)
    }
}

impl fmt::Display for Eurid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Address::from(*self).fmt(f)
    }
}

impl fmt::Display for BaseAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Address::from(*self).fmt(f)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AddressError::Malformed(s.to_string());
        let mut bytes = [0u8; 4];
        let mut parts = s.trim().split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(malformed)?;
            if part.len() != 2 {
                return Err(malformed());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| malformed())?;
        }
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Self::from_u32(u32::from_be_bytes(bytes)))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}
