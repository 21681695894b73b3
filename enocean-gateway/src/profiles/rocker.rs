//! F6-02-01: light and blind control, application style 1.

use enocean_protocol::eep::{EepDataField, SimpleProfile};
use enocean_protocol::EepId;

use super::{metadata, push_button, ProfileHandler};

const ROCKER: [(u64, &str); 4] = [(0, "AI"), (1, "AO"), (2, "BI"), (3, "BO")];

pub(super) fn f6_02_01() -> ProfileHandler {
    ProfileHandler::new(SimpleProfile {
        eep_id: EepId::new(0xF6, 0x02, 0x01),
        name: "Light and blind control - application style 1",
        datafields: vec![
            EepDataField::new("R1", "Rocker 1st action", 0, 3).enumeration(ROCKER),
            EepDataField::new("EB", "Energy bow", 3, 1).enumeration([(0, "Released"), (1, "Pressed")]),
            EepDataField::new("R2", "Rocker 2nd action", 4, 3).enumeration(ROCKER),
            EepDataField::new("SA", "2nd action", 7, 1)
                .enumeration([(0, "No 2nd action"), (1, "2nd action valid")]),
        ],
    })
    .with_capability(push_button())
    .with_capability(metadata())
}
