//! Gateway error types.

use thiserror::Error;

use enocean_protocol::{Address, AddressError, BaseAddress, EepError, EepId, ProtocolError, ReturnCode};

/// Reasons a base ID change did not take effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BaseIdChangeError {
    /// The confirmation flag was not 0x7B.
    #[error("invalid safety flag 0x{0:02X}")]
    InvalidSafetyFlag(u8),

    /// Requested value is not a valid module base ID.
    #[error("invalid base ID: {0}")]
    InvalidBaseId(#[from] AddressError),

    /// The module already uses this base ID.
    #[error("base ID is already {0}")]
    Unchanged(BaseAddress),

    /// The module rejected the write.
    #[error("module rejected base ID change: {0:?}")]
    Rejected(ReturnCode),

    /// Read-back still reports the previous base ID.
    #[error("base ID is still {0} after the write")]
    NotApplied(BaseAddress),

    /// Read-back reports neither the old nor the requested base ID.
    #[error("module reports base ID {reported:?} after requesting {requested}")]
    Unexpected {
        requested: BaseAddress,
        reported: Option<BaseAddress>,
    },
}

/// Errors surfaced by the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport could not be opened.
    #[error("failed to connect to {target}: {source}")]
    ConnectionFailed {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Transport closed while a caller was waiting on it.
    #[error("connection closed")]
    ConnectionClosed,

    /// The module answered with a failure code.
    #[error("command failed with {code:?}")]
    CommandFailed { code: ReturnCode },

    /// Base ID change failed.
    #[error("base ID change failed: {0}")]
    BaseIdChange(#[from] BaseIdChangeError),

    /// No profile is registered for the device.
    #[error("unknown device {0}")]
    UnknownDevice(Address),

    /// No handler exists for the device's profile.
    #[error("no profile handler for {0}")]
    NoProfile(EepId),

    #[error("EEP error: {0}")]
    Eep(#[from] EepError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}
