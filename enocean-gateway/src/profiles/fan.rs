//! D2-20-02: fan control, speed only.
//!
//! The leading bit tells a control message sent to the fan from the status
//! message the fan reports back.

use std::collections::{BTreeMap, HashMap};

use enocean_protocol::eep::{CommandEncoder, CommandProfile, CommandSelector, EepDataField, EepTelegram};
use enocean_protocol::{Action, ActionUid, EepError, EepId, EepMessage};

use super::{metadata, scalar, ProfileHandler};
use crate::observable;

const MT_CONTROL: u64 = 0;
const MT_STATUS: u64 = 1;

const ROOM_SIZE_REFERENCE: [(u64, &str); 4] = [(0, "Used"), (1, "Not used"), (2, "Default"), (3, "No change")];
const SERVICE_INFORMATION: [(u64, &str); 4] = [
    (0, "Nothing to report"),
    (1, "Air filter error"),
    (2, "Hardware error"),
    (7, "Not supported"),
];

fn message_type() -> EepDataField {
    EepDataField::new("MT", "Message type", 0, 1).enumeration([(MT_CONTROL, "Fan control"), (MT_STATUS, "Fan status")])
}

fn telegrams() -> BTreeMap<u64, EepTelegram> {
    let mut telegrams = BTreeMap::new();
    telegrams.insert(
        MT_CONTROL,
        EepTelegram::new(
            "Fan control",
            vec![
                message_type(),
                EepDataField::new("RSR", "Room size reference", 1, 2)
                    .enumeration(ROOM_SIZE_REFERENCE)
                    .default_raw(3),
                EepDataField::new("RS", "Room size", 3, 4).default_raw(15),
                // 253 auto, 254 default, 255 no change
                EepDataField::new("FS", "Fan speed", 8, 8).unit("%").default_raw(255),
            ],
        ),
    );
    telegrams.insert(
        MT_STATUS,
        EepTelegram::new(
            "Fan status",
            vec![
                message_type(),
                EepDataField::new("SI", "Service information", 1, 3).enumeration(SERVICE_INFORMATION),
                EepDataField::new("RSS", "Room size status", 4, 4),
                EepDataField::new("FS", "Fan speed", 8, 8)
                    .unit("%")
                    .observable(observable::FAN_SPEED),
            ],
        ),
    );
    telegrams
}

fn encode_fan_speed(action: &Action) -> Result<EepMessage, EepError> {
    let Action::SetFanSpeed(set) = action else {
        return Err(EepError::UnsupportedAction(action.uid()));
    };
    Ok(EepMessage::command(MT_CONTROL, "Fan control")
        .with_raw("RSR", u64::from(set.room_size_reference()))
        .with_raw("RS", u64::from(set.room_size()))
        .with_raw("FS", u64::from(set.fan_speed())))
}

pub(super) fn d2_20_02() -> ProfileHandler {
    let mut command_encoders: HashMap<ActionUid, CommandEncoder> = HashMap::new();
    command_encoders.insert(ActionUid::SetFanSpeed, encode_fan_speed);

    ProfileHandler::new(CommandProfile {
        eep_id: EepId::new(0xD2, 0x20, 0x02),
        name: "Fan control, speed only",
        selector: CommandSelector::at_start(0, 1),
        telegrams: telegrams(),
        command_encoders,
    })
    .with_capability(scalar(observable::FAN_SPEED))
    .with_capability(metadata())
}
