//! Semantic identifiers shared by EEP fields and capabilities.

pub const TEMPERATURE: &str = "temperature";
pub const HUMIDITY: &str = "humidity";
pub const ILLUMINATION: &str = "illumination";
pub const MOTION: &str = "motion";
pub const VOLTAGE: &str = "voltage";
pub const VALVE_POSITION: &str = "valve_position";
pub const SET_POINT: &str = "set_point";
pub const TEMPERATURE_SETPOINT: &str = "temperature_setpoint";
pub const DAY_NIGHT: &str = "day_night";
pub const CONTACT_STATE: &str = "contact_state";
pub const METER_READING: &str = "meter_reading";
pub const ENERGY: &str = "energy";
pub const POWER: &str = "power";
pub const DIM_VALUE: &str = "dim_value";
pub const SWITCH_STATE: &str = "switch_state";
pub const POSITION: &str = "position";
pub const ANGLE: &str = "angle";
pub const FAN_SPEED: &str = "fan_speed";
pub const COVER_STATE: &str = "cover_state";
pub const PUSH_BUTTON: &str = "push_button";
pub const RSSI: &str = "rssi";
pub const LAST_SEEN: &str = "last_seen";

const ALL: [&str; 22] = [
    TEMPERATURE,
    HUMIDITY,
    ILLUMINATION,
    MOTION,
    VOLTAGE,
    VALVE_POSITION,
    SET_POINT,
    TEMPERATURE_SETPOINT,
    DAY_NIGHT,
    CONTACT_STATE,
    METER_READING,
    ENERGY,
    POWER,
    DIM_VALUE,
    SWITCH_STATE,
    POSITION,
    ANGLE,
    FAN_SPEED,
    COVER_STATE,
    PUSH_BUTTON,
    RSSI,
    LAST_SEEN,
];

/// Static identifier equal to `uid`, if it is a known observable.
pub fn find(uid: &str) -> Option<&'static str> {
    ALL.iter().copied().find(|known| *known == uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        assert_eq!(find("position"), Some(POSITION));
        assert_eq!(find("meter_reading"), Some(METER_READING));
        assert_eq!(find("nope"), None);
    }
}
