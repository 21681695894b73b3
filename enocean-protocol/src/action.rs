//! Typed outbound commands.
//!
//! Every action validates its parameters when constructed and is immutable
//! afterwards. Profiles pick the encoder for an action by its [`ActionUid`].

use serde::{Deserialize, Serialize};

use crate::error::EepError;

/// Channel value addressing all channels of a multi-channel actuator.
pub const ALL_CHANNELS: u8 = 15;

/// Identifier used to look up a profile's encoder for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionUid {
    Dim,
    Switch,
    SetCoverPosition,
    StopCover,
    QueryCoverPosition,
    SetFanSpeed,
}

/// Set a dimmer to an absolute or relative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimAction {
    dim_value: u8,
    ramp_time: u8,
    relative: bool,
    store: bool,
    switch_on: bool,
}

impl DimAction {
    /// Absolute dimming to `percent` (0 to 100) after `ramp_time` seconds.
    pub fn absolute(percent: u8, ramp_time: u8) -> Result<Self, EepError> {
        if percent > 100 {
            return Err(EepError::InvalidParameter {
                parameter: "dim_value",
                value: i64::from(percent),
                allowed: "0-100",
            });
        }
        Ok(Self {
            dim_value: percent,
            ramp_time,
            relative: false,
            store: false,
            switch_on: true,
        })
    }

    /// Dimming step relative to the current value.
    pub fn relative(step: u8, ramp_time: u8) -> Self {
        Self {
            dim_value: step,
            ramp_time,
            relative: true,
            store: false,
            switch_on: true,
        }
    }

    /// Ask the actuator to store the final value.
    pub fn stored(mut self) -> Self {
        self.store = true;
        self
    }

    /// Switch the output off instead of on.
    pub fn switched_off(mut self) -> Self {
        self.switch_on = false;
        self
    }

    pub fn dim_value(&self) -> u8 {
        self.dim_value
    }

    pub fn ramp_time(&self) -> u8 {
        self.ramp_time
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }

    pub fn store(&self) -> bool {
        self.store
    }

    pub fn switch_on(&self) -> bool {
        self.switch_on
    }
}

/// Switch a relay on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchAction {
    on: bool,
    time: u16,
    lock: bool,
    delay: bool,
}

impl SwitchAction {
    pub fn new(on: bool) -> Self {
        Self {
            on,
            time: 0,
            lock: false,
            delay: false,
        }
    }

    /// Switch for `tenths` of a second, as a delay or a duration.
    pub fn timed(on: bool, tenths: u16, delay: bool) -> Self {
        Self {
            on,
            time: tenths,
            lock: false,
            delay,
        }
    }

    /// Lock the output for the given time.
    pub fn locked(mut self) -> Self {
        self.lock = true;
        self
    }

    pub fn on(&self) -> bool {
        self.on
    }

    /// Time in tenths of a second.
    pub fn time(&self) -> u16 {
        self.time
    }

    pub fn lock(&self) -> bool {
        self.lock
    }

    pub fn delay(&self) -> bool {
        self.delay
    }
}

/// How a cover approaches its target position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RepositioningMode {
    #[default]
    Direct = 0,
    UpFirst = 1,
    DownFirst = 2,
}

/// Lock handling that accompanies a cover command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LockMode {
    #[default]
    NoChange = 0,
    Blockage = 1,
    Alarm = 2,
    Unblock = 7,
}

fn validate_channel(channel: u8) -> Result<u8, EepError> {
    if channel <= 3 || channel == ALL_CHANNELS {
        Ok(channel)
    } else {
        Err(EepError::InvalidParameter {
            parameter: "channel",
            value: i64::from(channel),
            allowed: "0-3 or 15",
        })
    }
}

/// Move a cover to a position and slat angle, both given in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetCoverPositionAction {
    position: u8,
    angle: u8,
    repositioning: RepositioningMode,
    lock: LockMode,
    channel: u8,
}

impl SetCoverPositionAction {
    pub fn new(position: u8, angle: u8) -> Result<Self, EepError> {
        for (parameter, value) in [("position", position), ("angle", angle)] {
            if value > 100 {
                return Err(EepError::InvalidParameter {
                    parameter,
                    value: i64::from(value),
                    allowed: "0-100",
                });
            }
        }
        Ok(Self {
            position,
            angle,
            repositioning: RepositioningMode::Direct,
            lock: LockMode::NoChange,
            channel: ALL_CHANNELS,
        })
    }

    pub fn with_repositioning(mut self, mode: RepositioningMode) -> Self {
        self.repositioning = mode;
        self
    }

    pub fn with_lock(mut self, mode: LockMode) -> Self {
        self.lock = mode;
        self
    }

    pub fn on_channel(mut self, channel: u8) -> Result<Self, EepError> {
        self.channel = validate_channel(channel)?;
        Ok(self)
    }

    pub fn position(&self) -> u8 {
        self.position
    }

    pub fn angle(&self) -> u8 {
        self.angle
    }

    pub fn repositioning(&self) -> RepositioningMode {
        self.repositioning
    }

    pub fn lock(&self) -> LockMode {
        self.lock
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }
}

/// Fan speed value asking the unit to run in automatic mode.
pub const FAN_SPEED_AUTO: u8 = 253;
/// Fan speed value selecting the unit's default speed.
pub const FAN_SPEED_DEFAULT: u8 = 254;
/// Fan speed, room size or room size reference left as they are.
pub const FAN_SPEED_NO_CHANGE: u8 = 255;

/// Set the speed of a controlled ventilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetFanSpeedAction {
    fan_speed: u8,
    room_size_reference: u8,
    room_size: u8,
}

impl SetFanSpeedAction {
    /// `fan_speed` is a percentage (0 to 100) or one of
    /// [`FAN_SPEED_AUTO`], [`FAN_SPEED_DEFAULT`] and [`FAN_SPEED_NO_CHANGE`].
    ///
    /// Room size and its reference are left unchanged.
    pub fn new(fan_speed: u8) -> Result<Self, EepError> {
        if fan_speed > 100 && fan_speed < FAN_SPEED_AUTO {
            return Err(EepError::InvalidParameter {
                parameter: "fan_speed",
                value: i64::from(fan_speed),
                allowed: "0-100, 253-255",
            });
        }
        Ok(Self {
            fan_speed,
            room_size_reference: 3,
            room_size: 15,
        })
    }

    /// 0 uses the room size, 1 ignores it, 2 restores the default, 3 keeps it.
    pub fn with_room_size_reference(mut self, reference: u8) -> Result<Self, EepError> {
        if reference > 3 {
            return Err(EepError::InvalidParameter {
                parameter: "room_size_reference",
                value: i64::from(reference),
                allowed: "0-3",
            });
        }
        self.room_size_reference = reference;
        Ok(self)
    }

    /// Room size class in steps of 25 m², 0 (below 25 m²) to 14 (above 350 m²); 15 keeps it.
    pub fn with_room_size(mut self, room_size: u8) -> Result<Self, EepError> {
        if room_size > 15 {
            return Err(EepError::InvalidParameter {
                parameter: "room_size",
                value: i64::from(room_size),
                allowed: "0-15",
            });
        }
        self.room_size = room_size;
        Ok(self)
    }

    pub fn fan_speed(&self) -> u8 {
        self.fan_speed
    }

    pub fn room_size_reference(&self) -> u8 {
        self.room_size_reference
    }

    pub fn room_size(&self) -> u8 {
        self.room_size
    }
}

/// Channel-only command, used by stop and query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAction {
    channel: u8,
}

impl ChannelAction {
    pub fn new(channel: u8) -> Result<Self, EepError> {
        Ok(Self {
            channel: validate_channel(channel)?,
        })
    }

    pub fn all() -> Self {
        Self { channel: ALL_CHANNELS }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }
}

/// A command for a device, encoded by the device's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Dim(DimAction),
    Switch(SwitchAction),
    SetCoverPosition(SetCoverPositionAction),
    StopCover(ChannelAction),
    QueryCoverPosition(ChannelAction),
    SetFanSpeed(SetFanSpeedAction),
}

impl Action {
    pub fn uid(&self) -> ActionUid {
        match self {
            Action::Dim(_) => ActionUid::Dim,
            Action::Switch(_) => ActionUid::Switch,
            Action::SetCoverPosition(_) => ActionUid::SetCoverPosition,
            Action::StopCover(_) => ActionUid::StopCover,
            Action::QueryCoverPosition(_) => ActionUid::QueryCoverPosition,
            Action::SetFanSpeed(_) => ActionUid::SetFanSpeed,
        }
    }
}

impl From<DimAction> for Action {
    fn from(value: DimAction) -> Self {
        Action::Dim(value)
    }
}

impl From<SwitchAction> for Action {
    fn from(value: SwitchAction) -> Self {
        Action::Switch(value)
    }
}

impl From<SetCoverPositionAction> for Action {
    fn from(value: SetCoverPositionAction) -> Self {
        Action::SetCoverPosition(value)
    }
}

impl From<SetFanSpeedAction> for Action {
    fn from(value: SetFanSpeedAction) -> Self {
        Action::SetFanSpeed(value)
    }
}
