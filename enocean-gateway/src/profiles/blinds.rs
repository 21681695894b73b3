//! D2-05-00: blinds control for position and angle.
//!
//! The command code sits in the last nibble of every telegram, whose length
//! depends on the command.

use std::collections::{BTreeMap, HashMap};

use enocean_protocol::eep::{CommandEncoder, CommandProfile, CommandSelector, EepDataField, EepTelegram};
use enocean_protocol::{Action, ActionUid, EepError, EepId, EepMessage};

use super::{cover, metadata, ProfileHandler};
use crate::observable;

const CMD_GO_TO: u64 = 1;
const CMD_STOP: u64 = 2;
const CMD_QUERY: u64 = 3;
const CMD_REPLY: u64 = 4;

const REPOSITIONING: [(u64, &str); 3] = [(0, "Direct"), (1, "Up, then position"), (2, "Down, then position")];
const LOCKING: [(u64, &str); 4] = [(0, "No change"), (1, "Blockage"), (2, "Alarm"), (7, "Deblockage")];

/// Position or angle in percent; 127 means unknown or unchanged.
fn percent(id: &'static str, name: &'static str, offset: usize, uid: &'static str) -> EepDataField {
    EepDataField::new(id, name, offset, 7).unit("%").observable(uid).default_raw(127)
}

fn channel(offset: usize) -> EepDataField {
    EepDataField::new("CHN", "Channel", offset, 4)
}

fn command(offset: usize) -> EepDataField {
    EepDataField::new("CMD", "Command", offset, 4)
}

fn telegrams() -> BTreeMap<u64, EepTelegram> {
    let mut telegrams = BTreeMap::new();
    telegrams.insert(
        CMD_GO_TO,
        EepTelegram::new(
            "Go to position and angle",
            vec![
                percent("POS", "Vertical position", 1, observable::POSITION),
                percent("ANG", "Rotation angle", 9, observable::ANGLE),
                EepDataField::new("REPO", "Repositioning", 17, 3).enumeration(REPOSITIONING),
                EepDataField::new("LOCK", "Locking modes", 21, 3).enumeration(LOCKING),
                channel(24),
                command(28),
            ],
        ),
    );
    telegrams.insert(CMD_STOP, EepTelegram::new("Stop", vec![channel(0), command(4)]));
    telegrams.insert(
        CMD_QUERY,
        EepTelegram::new("Query position and angle", vec![channel(0), command(4)]),
    );
    telegrams.insert(
        CMD_REPLY,
        EepTelegram::new(
            "Reply position and angle",
            vec![
                percent("POS", "Vertical position", 1, observable::POSITION),
                percent("ANG", "Rotation angle", 9, observable::ANGLE),
                EepDataField::new("LOCK", "Locking modes", 21, 3).enumeration(LOCKING),
                channel(24),
                command(28),
            ],
        ),
    );
    telegrams
}

fn encode_cover(action: &Action) -> Result<EepMessage, EepError> {
    match action {
        Action::SetCoverPosition(set) => Ok(EepMessage::command(CMD_GO_TO, "Go to position and angle")
            .with_raw("POS", u64::from(set.position()))
            .with_raw("ANG", u64::from(set.angle()))
            .with_raw("REPO", set.repositioning() as u64)
            .with_raw("LOCK", set.lock() as u64)
            .with_raw("CHN", u64::from(set.channel()))),
        Action::StopCover(stop) => {
            Ok(EepMessage::command(CMD_STOP, "Stop").with_raw("CHN", u64::from(stop.channel())))
        }
        Action::QueryCoverPosition(query) => Ok(EepMessage::command(CMD_QUERY, "Query position and angle")
            .with_raw("CHN", u64::from(query.channel()))),
        other => Err(EepError::UnsupportedAction(other.uid())),
    }
}

pub(super) fn d2_05_00() -> ProfileHandler {
    let mut command_encoders: HashMap<ActionUid, CommandEncoder> = HashMap::new();
    for uid in [ActionUid::SetCoverPosition, ActionUid::StopCover, ActionUid::QueryCoverPosition] {
        command_encoders.insert(uid, encode_cover);
    }

    ProfileHandler::new(CommandProfile {
        eep_id: EepId::new(0xD2, 0x05, 0x00),
        name: "Blinds control for position and angle",
        selector: CommandSelector::at_end(0, 4),
        telegrams: telegrams(),
        command_encoders,
    })
    .with_capability(cover())
    .with_capability(metadata())
}

#[cfg(test)]
mod tests {
    use super::*;
    use enocean_protocol::{Address, ChannelAction, EepValue, Erp1Telegram, Rorg, SetCoverPositionAction};

    fn blind() -> Address {
        Address::from_u32(0x05A0_0001)
    }

    #[test]
    fn test_decode_reply() {
        let handler = d2_05_00();
        let telegram = Erp1Telegram::new(Rorg::Vld, vec![0x32, 0x00, 0x00, 0x04], blind(), Address::Broadcast);
        let message = handler.specification.decode(&telegram).unwrap();

        assert_eq!(message.message_type.as_ref().map(|t| t.id), Some(CMD_REPLY));
        assert_eq!(message.entity(observable::POSITION), Some(&EepValue::Number(50.0)));
        assert_eq!(message.entity(observable::ANGLE), Some(&EepValue::Number(0.0)));
        assert_eq!(message.values["CHN"].raw, 0);
    }

    #[test]
    fn test_unregistered_command_fails() {
        let handler = d2_05_00();
        let telegram = Erp1Telegram::new(Rorg::Vld, vec![0x00, 0x00, 0x00, 0x09], blind(), Address::Broadcast);
        let err = handler.specification.decode(&telegram).unwrap_err();
        assert_eq!(err, EepError::UnsupportedCommand(9));
    }

    #[test]
    fn test_encode_go_to_position() {
        let handler = d2_05_00();
        let action: Action = SetCoverPositionAction::new(75, 20).unwrap().on_channel(1).unwrap().into();
        let (telegram, echoed) = handler
            .specification
            .encode(&action, Address::from_u32(0xFF80_0080), blind())
            .unwrap();

        assert_eq!(&telegram.data[..], &[75, 20, 0x00, 0x11]);
        assert_eq!(echoed.entity(observable::POSITION), Some(&EepValue::Number(75.0)));
        assert_eq!(echoed.entity(observable::ANGLE), Some(&EepValue::Number(20.0)));
    }

    #[test]
    fn test_encode_stop_and_query_are_one_byte() {
        let handler = d2_05_00();
        let stop = Action::StopCover(ChannelAction::all());
        let (telegram, echoed) = handler.specification.encode(&stop, Address::from_u32(1), blind()).unwrap();
        assert_eq!(&telegram.data[..], &[0xF2]);
        assert_eq!(echoed.message_type.as_ref().map(|t| t.id), Some(CMD_STOP));

        let query = Action::QueryCoverPosition(ChannelAction::new(2).unwrap());
        let (telegram, _) = handler.specification.encode(&query, Address::from_u32(1), blind()).unwrap();
        assert_eq!(&telegram.data[..], &[0x23]);
    }
}
