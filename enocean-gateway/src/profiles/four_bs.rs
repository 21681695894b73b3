//! 4BS sensor profiles.

use std::sync::Arc;

use enocean_protocol::eep::{EepDataField, FieldBound, FieldUnit, SimpleProfile};
use enocean_protocol::EepId;

use super::{lrnb, metadata, meter, scalar, ProfileHandler};
use crate::observable;

/// Largest 24-bit meter reading.
const METER_MAX: f64 = 16_777_215.0;

pub(super) fn handlers() -> Vec<ProfileHandler> {
    vec![
        a5_02_05(),
        a5_04_01(),
        a5_07_03(),
        a5_10(0x03, false),
        a5_10(0x06, true),
        a5_12_01(),
        a5_20_01(),
    ]
}

pub(super) fn find(eep: EepId) -> Option<ProfileHandler> {
    let handler = match (eep.func, eep.type_) {
        (0x02, 0x05) => a5_02_05(),
        (0x04, 0x01) => a5_04_01(),
        (0x07, 0x03) => a5_07_03(),
        (0x10, 0x03) => a5_10(0x03, false),
        (0x10, 0x06) => a5_10(0x06, true),
        (0x12, 0x01) => a5_12_01(),
        (0x20, 0x01) => a5_20_01(),
        _ => return None,
    };
    Some(handler)
}

fn temperature_inverted() -> EepDataField {
    EepDataField::new("TMP", "Temperature", 16, 8)
        .range(255.0, 0.0)
        .scale(0.0, 40.0)
        .unit("°C")
        .observable(observable::TEMPERATURE)
}

fn a5_02_05() -> ProfileHandler {
    ProfileHandler::new(SimpleProfile {
        eep_id: EepId::new(0xA5, 0x02, 0x05),
        name: "Temperature sensor range 0°C to +40°C",
        datafields: vec![temperature_inverted(), lrnb()],
    })
    .with_capability(scalar(observable::TEMPERATURE))
    .with_capability(metadata())
}

fn a5_04_01() -> ProfileHandler {
    ProfileHandler::new(SimpleProfile {
        eep_id: EepId::new(0xA5, 0x04, 0x01),
        name: "Temperature and humidity sensor, range 0°C to +40°C and 0% to 100%",
        datafields: vec![
            EepDataField::new("HUM", "Relative humidity", 8, 8)
                .range(0.0, 250.0)
                .scale(0.0, 100.0)
                .unit("%")
                .observable(observable::HUMIDITY),
            EepDataField::new("TMP", "Temperature", 16, 8)
                .range(0.0, 250.0)
                .scale(0.0, 40.0)
                .unit("°C")
                .observable(observable::TEMPERATURE),
            lrnb(),
            EepDataField::new("TSN", "Availability of the temperature sensor", 30, 1)
                .enumeration([(0, "Not available"), (1, "Available")]),
        ],
    })
    .with_capability(scalar(observable::TEMPERATURE))
    .with_capability(scalar(observable::HUMIDITY))
    .with_capability(metadata())
}

fn a5_07_03() -> ProfileHandler {
    ProfileHandler::new(SimpleProfile {
        eep_id: EepId::new(0xA5, 0x07, 0x03),
        name: "Occupancy sensor with supply voltage monitor and 10-bit illumination",
        datafields: vec![
            EepDataField::new("SVC", "Supply voltage", 0, 8)
                .range(0.0, 250.0)
                .scale(0.0, 5.0)
                .unit("V")
                .observable(observable::VOLTAGE),
            EepDataField::new("ILL", "Illumination", 8, 10)
                .range(0.0, 1000.0)
                .scale(0.0, 1000.0)
                .unit("lx")
                .observable(observable::ILLUMINATION),
            EepDataField::new("PIRS", "PIR status", 24, 1)
                .enumeration([(0, "Uncertain of occupancy status"), (1, "Motion detected")])
                .observable(observable::MOTION),
            lrnb(),
        ],
    })
    .with_capability(scalar(observable::MOTION))
    .with_capability(scalar(observable::ILLUMINATION))
    .with_capability(scalar(observable::VOLTAGE))
    .with_capability(metadata())
}

/// A5-10-03 (set point) and A5-10-06 (set point and day/night switch).
fn a5_10(type_: u8, day_night: bool) -> ProfileHandler {
    let mut datafields = vec![
        EepDataField::new("SP", "Set point", 8, 8)
            .range(0.0, 255.0)
            .scale(0.0, 255.0)
            .observable(observable::SET_POINT),
        temperature_inverted(),
        lrnb(),
    ];
    if day_night {
        datafields.push(
            EepDataField::new("SLSW", "Slide switch", 31, 1)
                .enumeration([(0, "Night/Off"), (1, "Day/On")])
                .observable(observable::DAY_NIGHT),
        );
    }
    let name = if day_night {
        "Room operating panel - temperature sensor, set point and day/night control"
    } else {
        "Room operating panel - temperature sensor and set point control"
    };

    let mut handler = ProfileHandler::new(SimpleProfile {
        eep_id: EepId::new(0xA5, 0x10, type_),
        name,
        datafields,
    })
    .with_capability(scalar(observable::SET_POINT))
    .with_capability(scalar(observable::TEMPERATURE));
    if day_night {
        handler = handler.with_capability(scalar(observable::DAY_NIGHT));
    }
    handler.with_capability(metadata())
}

fn meter_divisor(div: u64) -> f64 {
    METER_MAX / 10f64.powi(div as i32)
}

fn meter_unit(data_type: u64) -> Option<&'static str> {
    match data_type {
        0 => Some("kWh"),
        1 => Some("W"),
        _ => None,
    }
}

fn a5_12_01() -> ProfileHandler {
    // DIV and DT are decoded first so the reading can use them
    ProfileHandler::new(SimpleProfile {
        eep_id: EepId::new(0xA5, 0x12, 0x01),
        name: "Automated meter reading - electricity",
        datafields: vec![
            EepDataField::new("DIV", "Divisor", 30, 2)
                .enumeration([(0, "x/1"), (1, "x/10"), (2, "x/100"), (3, "x/1000")]),
            EepDataField::new("DT", "Data type", 29, 1)
                .enumeration([(0, "Cumulative value"), (1, "Current value")]),
            EepDataField::new("MR", "Meter reading", 0, 24)
                .range(0.0, METER_MAX)
                .scale_with(
                    Arc::new(0.0),
                    Arc::new(FieldBound {
                        field_id: "DIV",
                        map: meter_divisor,
                    }),
                )
                .unit_with(Arc::new(FieldUnit {
                    field_id: "DT",
                    map: meter_unit,
                }))
                .observable(observable::METER_READING),
            EepDataField::new("TI", "Tariff info", 24, 4),
            lrnb(),
        ],
    })
    .with_capability(meter())
    .with_capability(metadata())
}

fn a5_20_01() -> ProfileHandler {
    let flag = |id, name, offset| EepDataField::new(id, name, offset, 1).enumeration([(0, "False"), (1, "True")]);
    ProfileHandler::new(SimpleProfile {
        eep_id: EepId::new(0xA5, 0x20, 0x01),
        name: "HVAC component - battery powered actuator",
        datafields: vec![
            EepDataField::new("CV", "Current valve position", 0, 8)
                .range(0.0, 100.0)
                .scale(0.0, 100.0)
                .unit("%")
                .observable(observable::VALVE_POSITION),
            EepDataField::new("SO", "Service on", 8, 1).enumeration([(0, "Off"), (1, "On")]),
            flag("ENIE", "Energy input enabled", 9),
            flag("ES", "Energy storage charged", 10),
            EepDataField::new("BCAP", "Battery capacity low", 11, 1).enumeration([(0, "True"), (1, "False")]),
            flag("CCO", "Contact cover open", 12),
            flag("FTS", "Failure temperature sensor out of range", 13),
            flag("DWO", "Window open detected", 14),
            flag("ACO", "Actuator obstructed", 15),
            EepDataField::new("TMP", "Temperature", 16, 8)
                .range(0.0, 255.0)
                .scale(0.0, 40.0)
                .unit("°C")
                .observable(observable::TEMPERATURE),
            lrnb(),
        ],
    })
    .with_capability(scalar(observable::VALVE_POSITION))
    .with_capability(scalar(observable::TEMPERATURE))
    .with_capability(metadata())
}
