//! EEP identifiers in `RORG-FUNC-TYPE` form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Rorg;

/// Identifier of an EnOcean Equipment Profile, e.g. `A5-02-05`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EepId {
    pub rorg: u8,
    pub func: u8,
    pub type_: u8,
}

impl EepId {
    pub const fn new(rorg: u8, func: u8, type_: u8) -> Self {
        Self { rorg, func, type_ }
    }

    /// The profile's RORG, if it is one this stack knows.
    pub fn rorg(&self) -> Option<Rorg> {
        Rorg::try_from(self.rorg).ok()
    }
}

/// Error returned when an EEP string is not `XX-XX-XX` hex.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid EEP identifier: {0:?}")]
pub struct ParseEepIdError(pub String);

impl FromStr for EepId {
    type Err = ParseEepIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseEepIdError(s.to_string());
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.len() != 2) {
            return Err(invalid());
        }
        let byte = |p: &str| u8::from_str_radix(p, 16).map_err(|_| invalid());
        Ok(Self::new(byte(parts[0])?, byte(parts[1])?, byte(parts[2])?))
    }
}

impl fmt::Display for EepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}-{:02X}-{:02X}", self.rorg, self.func, self.type_)
    }
}

impl TryFrom<String> for EepId {
    type Error = ParseEepIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EepId> for String {
    fn from(value: EepId) -> Self {
        value.to_string()
    }
}
