//! EnOcean Equipment Profile engine.
//!
//! Profiles are data: a list of [`EepDataField`] descriptors (or one list per
//! command code) interpreted by a single decoder and encoder.

pub mod field;
pub mod id;
pub mod message;
pub mod profile;

pub use field::{DecodeContext, EepDataField, FieldBound, FieldUnit, ScaleBound, UnitSource};
pub use id::{EepId, ParseEepIdError};
pub use message::{EepMessage, EepMessageValue, EepValue, MessageType};
pub use profile::{
    CommandEncoder, CommandProfile, CommandSelector, EepSpecification, EepTelegram, SelectorAnchor,
    SimpleProfile,
};
