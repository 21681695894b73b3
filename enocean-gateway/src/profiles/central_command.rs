//! A5-38-08: central command, gateway.

use std::collections::{BTreeMap, HashMap};

use enocean_protocol::eep::{CommandEncoder, CommandProfile, CommandSelector, EepDataField, EepTelegram};
use enocean_protocol::{Action, ActionUid, EepError, EepId, EepMessage};

use super::{lrnb, ProfileHandler};
use crate::observable;

const CMD_SWITCHING: u64 = 1;
const CMD_DIMMING: u64 = 2;

fn command(code: u64, label: &'static str) -> EepDataField {
    EepDataField::new("CMD", "Command", 0, 8).enumeration([(code, label)])
}

fn switching() -> EepTelegram {
    EepTelegram::new(
        "Switching",
        vec![
            command(CMD_SWITCHING, "Switching"),
            EepDataField::new("TIM", "Time in 1/10 seconds", 8, 16)
                .range(0.0, 65535.0)
                .scale(0.0, 6553.5)
                .unit("s"),
            lrnb(),
            EepDataField::new("LCK", "Lock for duration time", 29, 1)
                .enumeration([(0, "Unlock"), (1, "Lock")]),
            EepDataField::new("DEL", "Delay or duration", 30, 1)
                .enumeration([(0, "Duration"), (1, "Delay")]),
            EepDataField::new("SW", "Switching command", 31, 1)
                .enumeration([(0, "Off"), (1, "On")])
                .observable(observable::SWITCH_STATE),
        ],
    )
}

fn dimming() -> EepTelegram {
    EepTelegram::new(
        "Dimming",
        vec![
            command(CMD_DIMMING, "Dimming"),
            EepDataField::new("EDIM", "Dimming value", 8, 8).observable(observable::DIM_VALUE),
            EepDataField::new("RMP", "Ramping time", 16, 8).unit("s"),
            lrnb(),
            EepDataField::new("EDIMR", "Dimming range", 29, 1)
                .enumeration([(0, "Absolute"), (1, "Relative")]),
            EepDataField::new("STR", "Store final value", 30, 1).enumeration([(0, "No"), (1, "Yes")]),
            EepDataField::new("SW", "Switching command", 31, 1)
                .enumeration([(0, "Off"), (1, "On")])
                .observable(observable::SWITCH_STATE),
        ],
    )
}

fn encode_switch(action: &Action) -> Result<EepMessage, EepError> {
    let Action::Switch(switch) = action else {
        return Err(EepError::UnsupportedAction(action.uid()));
    };
    Ok(EepMessage::command(CMD_SWITCHING, "Switching")
        .with_raw("TIM", u64::from(switch.time()))
        .with_raw("LCK", u64::from(switch.lock()))
        .with_raw("DEL", u64::from(switch.delay()))
        .with_raw("SW", u64::from(switch.on())))
}

fn encode_dim(action: &Action) -> Result<EepMessage, EepError> {
    let Action::Dim(dim) = action else {
        return Err(EepError::UnsupportedAction(action.uid()));
    };
    Ok(EepMessage::command(CMD_DIMMING, "Dimming")
        .with_raw("EDIM", u64::from(dim.dim_value()))
        .with_raw("RMP", u64::from(dim.ramp_time()))
        .with_raw("EDIMR", u64::from(dim.is_relative()))
        .with_raw("STR", u64::from(dim.store()))
        .with_raw("SW", u64::from(dim.switch_on())))
}

pub(super) fn a5_38_08() -> ProfileHandler {
    let mut telegrams = BTreeMap::new();
    telegrams.insert(CMD_SWITCHING, switching());
    telegrams.insert(CMD_DIMMING, dimming());

    let mut command_encoders: HashMap<ActionUid, CommandEncoder> = HashMap::new();
    command_encoders.insert(ActionUid::Switch, encode_switch);
    command_encoders.insert(ActionUid::Dim, encode_dim);

    ProfileHandler::new(CommandProfile {
        eep_id: EepId::new(0xA5, 0x38, 0x08),
        name: "Central command - gateway",
        selector: CommandSelector::at_start(0, 8),
        telegrams,
        command_encoders,
    })
}
