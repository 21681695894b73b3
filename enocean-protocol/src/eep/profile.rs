//! Profile specifications and the decode/encode engine.

use std::collections::{BTreeMap, HashMap};

use log::trace;

use crate::action::{Action, ActionUid};
use crate::address::Address;
use crate::bitfield;
use crate::eep::field::{DecodeContext, EepDataField};
use crate::eep::message::{EepMessage, MessageType};
use crate::eep::EepId;
use crate::erp1::Erp1Telegram;
use crate::error::{EepError, ProtocolError};
use crate::types::Rorg;

/// Turns an action into an outbound message with raw field values.
pub type CommandEncoder = fn(&Action) -> Result<EepMessage, EepError>;

/// One field layout of a profile.
#[derive(Debug, Clone)]
pub struct EepTelegram {
    pub name: &'static str,
    pub datafields: Vec<EepDataField>,
}

impl EepTelegram {
    pub fn new(name: &'static str, datafields: Vec<EepDataField>) -> Self {
        Self { name, datafields }
    }

    fn field(&self, id: &str) -> Option<&EepDataField> {
        self.datafields.iter().find(|f| f.id == id)
    }

    fn bit_len(&self) -> usize {
        self.datafields.iter().map(EepDataField::end).max().unwrap_or(0)
    }
}

/// Where the command selector offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorAnchor {
    /// Offset counts from the first payload bit.
    Start,
    /// Offset counts back from the last payload bit, so telegrams of
    /// different lengths share one selector.
    End,
}

/// Position of the command code inside a telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSelector {
    pub offset: usize,
    pub size: usize,
    pub anchor: SelectorAnchor,
}

impl CommandSelector {
    pub fn at_start(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            anchor: SelectorAnchor::Start,
        }
    }

    pub fn at_end(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            anchor: SelectorAnchor::End,
        }
    }

    /// Absolute bit offset within a payload of `total_bits`.
    pub fn effective_offset(&self, total_bits: usize) -> Option<usize> {
        match self.anchor {
            SelectorAnchor::Start => Some(self.offset),
            SelectorAnchor::End => total_bits.checked_sub(self.size + self.offset),
        }
    }
}

/// Profile with one fixed layout.
#[derive(Debug, Clone)]
pub struct SimpleProfile {
    pub eep_id: EepId,
    pub name: &'static str,
    pub datafields: Vec<EepDataField>,
}

/// Profile whose layout is chosen by a command code.
#[derive(Debug, Clone)]
pub struct CommandProfile {
    pub eep_id: EepId,
    pub name: &'static str,
    pub selector: CommandSelector,
    pub telegrams: BTreeMap<u64, EepTelegram>,
    pub command_encoders: HashMap<ActionUid, CommandEncoder>,
}

/// A profile known to the engine.
#[derive(Debug, Clone)]
pub enum EepSpecification {
    Simple(SimpleProfile),
    Command(CommandProfile),
}

impl From<SimpleProfile> for EepSpecification {
    fn from(value: SimpleProfile) -> Self {
        EepSpecification::Simple(value)
    }
}

impl From<CommandProfile> for EepSpecification {
    fn from(value: CommandProfile) -> Self {
        EepSpecification::Command(value)
    }
}

fn decode_fields(
    message: &mut EepMessage,
    datafields: &[EepDataField],
    data: &[u8],
) -> Result<(), EepError> {
    for field in datafields {
        let value = field.decode(data, &DecodeContext::new(&message.values))?;
        if let Some(uid) = field.observable_uid {
            message.entities.insert(uid.to_string(), value.clone());
        }
        message.values.insert(field.id.to_string(), value);
    }
    Ok(())
}

impl EepSpecification {
    pub fn eep_id(&self) -> EepId {
        match self {
            EepSpecification::Simple(p) => p.eep_id,
            EepSpecification::Command(p) => p.eep_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EepSpecification::Simple(p) => p.name,
            EepSpecification::Command(p) => p.name,
        }
    }

    /// Whether an encoder exists for `uid`.
    pub fn supports(&self, uid: ActionUid) -> bool {
        match self {
            EepSpecification::Simple(_) => false,
            EepSpecification::Command(p) => p.command_encoders.contains_key(&uid),
        }
    }

    /// Decode a telegram into an [`EepMessage`].
    pub fn decode(&self, telegram: &Erp1Telegram) -> Result<EepMessage, EepError> {
        let eep_id = self.eep_id();
        if eep_id.rorg != u8::from(telegram.rorg) {
            return Err(EepError::RorgMismatch {
                expected: eep_id.rorg,
                actual: telegram.rorg.into(),
            });
        }

        let mut message = EepMessage::new(Some(telegram.sender), Some(eep_id));
        message.rssi = telegram.rssi_dbm();

        match self {
            EepSpecification::Simple(profile) => {
                decode_fields(&mut message, &profile.datafields, &telegram.data)?;
            }
            EepSpecification::Command(profile) => {
                let total_bits = telegram.data.len() * 8;
                let offset = profile
                    .selector
                    .effective_offset(total_bits)
                    .ok_or(ProtocolError::BitRange {
                        offset: profile.selector.offset,
                        size: profile.selector.size,
                        bits: total_bits,
                    })?;
                let code = bitfield::raw_bits(&telegram.data, offset, profile.selector.size)?;
                let layout = profile.telegrams.get(&code).ok_or(EepError::UnsupportedCommand(code))?;
                trace!("{} command {} ({})", eep_id, code, layout.name);
                message.message_type = Some(MessageType {
                    id: code,
                    description: layout.name.to_string(),
                });
                decode_fields(&mut message, &layout.datafields, &telegram.data)?;
            }
        }
        Ok(message)
    }

    /// Encode an action into a telegram addressed to `destination`.
    ///
    /// Returns the telegram together with the message obtained by decoding
    /// it again, whose entities describe the commanded state.
    pub fn encode(
        &self,
        action: &Action,
        sender: Address,
        destination: Address,
    ) -> Result<(Erp1Telegram, EepMessage), EepError> {
        let EepSpecification::Command(profile) = self else {
            return Err(EepError::UnsupportedAction(action.uid()));
        };
        let encoder = profile
            .command_encoders
            .get(&action.uid())
            .ok_or(EepError::UnsupportedAction(action.uid()))?;
        let rorg = profile
            .eep_id
            .rorg()
            .ok_or(EepError::UnknownRorg(profile.eep_id.rorg))?;

        let outbound = encoder(action)?;
        let message_type = outbound.message_type.as_ref().ok_or(EepError::MissingMessageType)?;
        let code = message_type.id;
        let layout = profile.telegrams.get(&code).ok_or(EepError::UnsupportedCommand(code))?;

        for field_id in outbound.values.keys() {
            if layout.field(field_id).is_none() {
                return Err(EepError::UnknownField(field_id.clone()));
            }
        }

        let byte_len = match rorg {
            Rorg::Bs4 => 4,
            _ => (layout.bit_len().max(profile.selector.offset + profile.selector.size) + 7) / 8,
        };
        let mut data = vec![0u8; byte_len];

        for field in &layout.datafields {
            let raw = outbound
                .values
                .get(field.id)
                .map_or(field.default_raw, |v| v.raw);
            bitfield::set_raw_bits(&mut data, field.offset, field.size, raw)?;
        }
        // selector last so a layout field covering it cannot clear the code
        if let Some(offset) = profile.selector.effective_offset(byte_len * 8) {
            bitfield::set_raw_bits(&mut data, offset, profile.selector.size, code)?;
        }

        let telegram = Erp1Telegram::new(rorg, data, sender, destination);
        let mut echoed = self.decode(&telegram)?;
        echoed.sender = Some(destination);
        Ok((telegram, echoed))
    }
}
