//! Device state-change events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use enocean_protocol::{Address, EepValue};

/// Where a state change originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateChangeSource {
    /// Derived from a received telegram.
    Telegram,
    /// Inferred locally when a timer expired.
    Timer,
}

/// A single observed change of a device property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChange {
    pub device_address: Address,
    pub observable_uid: &'static str,
    pub value: EepValue,
    pub unit: Option<String>,
    pub channel: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub source: StateChangeSource,
}

impl StateChange {
    /// A telegram-sourced change stamped with the current time.
    pub fn telegram(device_address: Address, observable_uid: &'static str, value: EepValue) -> Self {
        Self {
            device_address,
            observable_uid,
            value,
            unit: None,
            channel: None,
            timestamp: Utc::now(),
            source: StateChangeSource::Telegram,
        }
    }

    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_channel(mut self, channel: Option<u64>) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_source(mut self, source: StateChangeSource) -> Self {
        self.source = source;
        self
    }
}

/// Receiver of state changes emitted by capabilities.
pub type StateSink = Arc<dyn Fn(StateChange) + Send + Sync>;
