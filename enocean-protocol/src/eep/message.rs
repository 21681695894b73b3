//! Decoded EEP messages.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::address::Address;
use crate::eep::EepId;

/// Semantic value of a decoded field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EepValue {
    Number(f64),
    Label(String),
}

impl EepValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EepValue::Number(n) => Some(*n),
            EepValue::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            EepValue::Number(_) => None,
            EepValue::Label(label) => Some(label),
        }
    }
}

impl fmt::Display for EepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EepValue::Number(n) => write!(f, "{}", n),
            EepValue::Label(label) => f.write_str(label),
        }
    }
}

/// One field's raw bits and their interpretation.
///
/// `value` is `None` when an enumerated field carries a raw value with no label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EepMessageValue {
    pub raw: u64,
    pub value: Option<EepValue>,
    pub unit: Option<String>,
}

impl EepMessageValue {
    /// Raw value with no interpretation, as produced by encoders.
    pub fn raw(raw: u64) -> Self {
        Self {
            raw,
            value: None,
            unit: None,
        }
    }
}

/// Command selected in a command-dispatch profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageType {
    pub id: u64,
    pub description: String,
}

/// Result of applying a profile to a telegram, or the input to encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EepMessage {
    pub sender: Option<Address>,
    pub eep_id: Option<EepId>,
    pub message_type: Option<MessageType>,
    /// Decoded fields keyed by field id.
    pub values: BTreeMap<String, EepMessageValue>,
    /// Fields carrying an observable UID, keyed by that UID.
    pub entities: BTreeMap<String, EepMessageValue>,
    /// Signal strength in dBm of the telegram this was decoded from.
    pub rssi: Option<i16>,
}

impl EepMessage {
    pub fn new(sender: Option<Address>, eep_id: Option<EepId>) -> Self {
        Self {
            sender,
            eep_id,
            message_type: None,
            values: BTreeMap::new(),
            entities: BTreeMap::new(),
            rssi: None,
        }
    }

    /// Start an outbound message for the given command.
    pub fn command(id: u64, description: impl Into<String>) -> Self {
        let mut message = Self::new(None, None);
        message.message_type = Some(MessageType {
            id,
            description: description.into(),
        });
        message
    }

    /// Set the raw value of a field.
    pub fn with_raw(mut self, field_id: &str, raw: u64) -> Self {
        self.values.insert(field_id.to_string(), EepMessageValue::raw(raw));
        self
    }

    /// Interpreted value of an entity, if present and interpretable.
    pub fn entity(&self, observable_uid: &str) -> Option<&EepValue> {
        self.entities.get(observable_uid).and_then(|v| v.value.as_ref())
    }
}
