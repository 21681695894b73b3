//! Teach-in telegrams: universal teach-in (UTE) and the 1BS/4BS learn variants.
//!
//! UTE payload (7 bytes, DB6 first):
//! ```text
//! DB6: | comm mode (1) | response expected (1) | request/response type (2) | command (4) |
//! DB5: channel count
//! DB4: manufacturer ID, low byte
//! DB3: manufacturer ID, high 3 bits
//! DB2: TYPE   DB1: FUNC   DB0: RORG
//! ```

use crate::address::Address;
use crate::bitfield;
use crate::eep::EepId;
use crate::erp1::Erp1Telegram;
use crate::error::ProtocolError;
use crate::types::Rorg;

/// Length of a UTE payload.
pub const UTE_DATA_LEN: usize = 7;

/// Communication the device will use after teach-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicationMode {
    Unidirectional,
    Bidirectional,
}

/// Whether the device waits for a teach-in response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseExpectation {
    Expected,
    NotExpected,
}

/// What a UTE query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UteQueryType {
    TeachIn,
    Deletion,
    TeachInOrDeletion,
    NotUsed,
}

/// Outcome reported by a UTE response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UteResponseType {
    NotAccepted,
    AcceptedTeachIn,
    AcceptedDeletion,
    EepNotSupported,
}

/// Query or response discriminant with its request-type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UteRequest {
    Query {
        expectation: ResponseExpectation,
        request_type: UteQueryType,
    },
    Response(UteResponseType),
}

/// A parsed or outbound UTE message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UteMessage {
    pub communication_mode: CommunicationMode,
    pub request: UteRequest,
    /// Number of channels to be taught in; 0xFF means all.
    pub channels: u8,
    pub manufacturer_id: u16,
    pub eep: EepId,
    pub sender: Address,
    pub destination: Option<Address>,
}

impl UteMessage {
    /// Parse a UTE telegram.
    pub fn parse(telegram: &Erp1Telegram) -> Result<Self, ProtocolError> {
        if telegram.rorg != Rorg::Ute {
            return Err(ProtocolError::UnexpectedRorg {
                expected: Rorg::Ute,
                actual: telegram.rorg,
            });
        }
        if telegram.data.len() < UTE_DATA_LEN {
            return Err(ProtocolError::TooShort {
                expected: UTE_DATA_LEN,
                actual: telegram.data.len(),
            });
        }

        let data = &telegram.data;
        let communication_mode = match bitfield::raw_bits(data, 0, 1)? {
            0 => CommunicationMode::Unidirectional,
            _ => CommunicationMode::Bidirectional,
        };
        let request_type = bitfield::raw_bits(data, 2, 2)?;
        let request = match bitfield::raw_bits(data, 4, 4)? {
            0 => UteRequest::Query {
                expectation: match bitfield::raw_bits(data, 1, 1)? {
                    0 => ResponseExpectation::Expected,
                    _ => ResponseExpectation::NotExpected,
                },
                request_type: match request_type {
                    0 => UteQueryType::TeachIn,
                    1 => UteQueryType::Deletion,
                    2 => UteQueryType::TeachInOrDeletion,
                    _ => UteQueryType::NotUsed,
                },
            },
            1 => UteRequest::Response(match request_type {
                0 => UteResponseType::NotAccepted,
                1 => UteResponseType::AcceptedTeachIn,
                2 => UteResponseType::AcceptedDeletion,
                _ => UteResponseType::EepNotSupported,
            }),
            other => {
                return Err(ProtocolError::InvalidField {
                    field: "UTE command",
                    value: other,
                })
            }
        };

        Ok(Self {
            communication_mode,
            request,
            channels: data[1],
            manufacturer_id: (u16::from(data[3] & 0x07) << 8) | u16::from(data[2]),
            eep: EepId::new(data[6], data[5], data[4]),
            sender: telegram.sender,
            destination: telegram.destination,
        })
    }

    pub fn is_query(&self) -> bool {
        matches!(self.request, UteRequest::Query { .. })
    }

    /// Build the response to this query, sent from `sender` back to the querying device.
    pub fn response_for_query(&self, response: UteResponseType, sender: Address) -> Result<Self, ProtocolError> {
        if !self.is_query() {
            return Err(ProtocolError::NotAQuery);
        }
        Ok(Self {
            communication_mode: self.communication_mode,
            request: UteRequest::Response(response),
            channels: self.channels,
            manufacturer_id: self.manufacturer_id,
            eep: self.eep,
            sender,
            destination: Some(self.sender),
        })
    }

    /// Serialize into a UTE telegram.
    pub fn to_erp1(&self) -> Result<Erp1Telegram, ProtocolError> {
        let mut data = [0u8; UTE_DATA_LEN];
        let mode = match self.communication_mode {
            CommunicationMode::Unidirectional => 0,
            CommunicationMode::Bidirectional => 1,
        };
        let (expectation, request_type, command) = match self.request {
            UteRequest::Query {
                expectation,
                request_type,
            } => (
                match expectation {
                    ResponseExpectation::Expected => 0,
                    ResponseExpectation::NotExpected => 1,
                },
                match request_type {
                    UteQueryType::TeachIn => 0,
                    UteQueryType::Deletion => 1,
                    UteQueryType::TeachInOrDeletion => 2,
                    UteQueryType::NotUsed => 3,
                },
                0,
            ),
            UteRequest::Response(response) => (
                0,
                match response {
                    UteResponseType::NotAccepted => 0,
                    UteResponseType::AcceptedTeachIn => 1,
                    UteResponseType::AcceptedDeletion => 2,
                    UteResponseType::EepNotSupported => 3,
                },
                1,
            ),
        };
        bitfield::set_raw_bits(&mut data, 0, 1, mode)?;
        bitfield::set_raw_bits(&mut data, 1, 1, expectation)?;
        bitfield::set_raw_bits(&mut data, 2, 2, request_type)?;
        bitfield::set_raw_bits(&mut data, 4, 4, command)?;
        data[1] = self.channels;
        data[2] = (self.manufacturer_id & 0xFF) as u8;
        data[3] = ((self.manufacturer_id >> 8) & 0x07) as u8;
        data[4] = self.eep.type_;
        data[5] = self.eep.func;
        data[6] = self.eep.rorg;

        Ok(Erp1Telegram::new(
            Rorg::Ute,
            data.to_vec(),
            self.sender,
            self.destination.unwrap_or(Address::Broadcast),
        ))
    }
}

/// 4BS teach-in telegram.
///
/// Variant 2 telegrams (LRN type bit set) carry FUNC, TYPE and manufacturer;
/// variant 1 telegrams carry nothing and leave `eep` empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FourBsTeachIn {
    pub sender: Address,
    pub eep: Option<EepId>,
    pub manufacturer_id: Option<u16>,
}

impl FourBsTeachIn {
    pub fn parse(telegram: &Erp1Telegram) -> Result<Self, ProtocolError> {
        if telegram.rorg != Rorg::Bs4 {
            return Err(ProtocolError::UnexpectedRorg {
                expected: Rorg::Bs4,
                actual: telegram.rorg,
            });
        }
        let with_eep = telegram.raw_bits(24, 1)? == 1;
        let (eep, manufacturer_id) = if with_eep {
            let func = telegram.raw_bits(0, 6)? as u8;
            let type_ = telegram.raw_bits(6, 7)? as u8;
            let manufacturer = telegram.raw_bits(13, 11)? as u16;
            (Some(EepId::new(u8::from(Rorg::Bs4), func, type_)), Some(manufacturer))
        } else {
            (None, None)
        };
        Ok(Self {
            sender: telegram.sender,
            eep,
            manufacturer_id,
        })
    }
}

/// Any teach-in request seen on the air.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeachIn {
    Ute(UteMessage),
    FourBs(FourBsTeachIn),
    OneBs { sender: Address },
}

impl TeachIn {
    /// Recognize a teach-in telegram. Returns `Ok(None)` for ordinary data telegrams.
    pub fn from_erp1(telegram: &Erp1Telegram) -> Result<Option<Self>, ProtocolError> {
        match telegram.rorg {
            Rorg::Ute => UteMessage::parse(telegram).map(|m| Some(TeachIn::Ute(m))),
            Rorg::Bs4 if telegram.is_teach_in() => FourBsTeachIn::parse(telegram).map(|t| Some(TeachIn::FourBs(t))),
            Rorg::Bs1 if telegram.is_teach_in() => Ok(Some(TeachIn::OneBs {
                sender: telegram.sender,
            })),
            _ => Ok(None),
        }
    }

    pub fn sender(&self) -> Address {
        match self {
            TeachIn::Ute(m) => m.sender,
            TeachIn::FourBs(t) => t.sender,
            TeachIn::OneBs { sender } => *sender,
        }
    }

    /// Profile requested by the device, when the telegram names one.
    pub fn eep(&self) -> Option<EepId> {
        match self {
            TeachIn::Ute(m) => Some(m.eep),
            TeachIn::FourBs(t) => t.eep,
            TeachIn::OneBs { .. } => None,
        }
    }
}
