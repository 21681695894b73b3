//! Cover (blind/shutter) capability with a movement watchdog.
//!
//! Cover actuators report positions while moving but do not always report
//! the end of a movement. After an "opening" or "closing" state a watchdog
//! is armed; if no further report arrives before it fires, the cover is
//! reported as stopped with [`StateChangeSource::Timer`].

use std::time::Duration;

use log::trace;
use tokio::task::JoinHandle;

use enocean_protocol::{Address, EepMessage, EepValue};

use super::Capability;
use crate::observable;
use crate::state_change::{StateChange, StateChangeSource, StateSink};

/// Watchdog duration used when none is configured.
pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(5);

/// Message type of position/angle reports.
pub const REPLY_POSITION_AND_ANGLE: u64 = 4;

/// Derived movement state of a cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverState {
    Open,
    Closed,
    Opening,
    Closing,
    Stopped,
}

impl CoverState {
    pub fn as_str(self) -> &'static str {
        match self {
            CoverState::Open => "open",
            CoverState::Closed => "closed",
            CoverState::Opening => "opening",
            CoverState::Closing => "closing",
            CoverState::Stopped => "stopped",
        }
    }

    /// State implied by a new position, given the previous one.
    pub fn derive(position: f64, previous: Option<f64>) -> Option<Self> {
        if position == 0.0 {
            return Some(CoverState::Open);
        }
        if position == 100.0 {
            return Some(CoverState::Closed);
        }
        let previous = previous?;
        Some(if position > previous {
            CoverState::Closing
        } else if position < previous {
            CoverState::Opening
        } else {
            CoverState::Stopped
        })
    }

    fn is_moving(self) -> bool {
        matches!(self, CoverState::Opening | CoverState::Closing)
    }
}

fn state_value(state: CoverState) -> EepValue {
    EepValue::Label(state.as_str().to_string())
}

/// Tracks position, angle and movement of one cover.
pub struct CoverCapability {
    device_address: Address,
    sink: StateSink,
    watchdog_duration: Duration,
    last_position: Option<f64>,
    watchdog: Option<JoinHandle<()>>,
}

impl CoverCapability {
    pub fn new(device_address: Address, sink: StateSink) -> Self {
        Self::with_watchdog(device_address, sink, DEFAULT_WATCHDOG)
    }

    pub fn with_watchdog(device_address: Address, sink: StateSink, watchdog_duration: Duration) -> Self {
        Self {
            device_address,
            sink,
            watchdog_duration,
            last_position: None,
            watchdog: None,
        }
    }

    /// Whether a watchdog is currently pending.
    pub fn watchdog_armed(&self) -> bool {
        self.watchdog.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    fn arm_watchdog(&mut self) {
        self.cancel_watchdog();
        let sink = self.sink.clone();
        let device = self.device_address;
        let duration = self.watchdog_duration;
        trace!("{}: arming cover watchdog for {:?}", device, duration);
        self.watchdog = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            sink(
                StateChange::telegram(device, observable::COVER_STATE, state_value(CoverState::Stopped))
                    .with_source(StateChangeSource::Timer),
            );
        }));
    }

    fn cancel_watchdog(&mut self) {
        if let Some(handle) = self.watchdog.take() {
            handle.abort();
        }
    }

    fn emit(&self, observable_uid: &'static str, value: EepValue, unit: Option<String>) {
        (self.sink)(StateChange::telegram(self.device_address, observable_uid, value).with_unit(unit));
    }
}

impl Capability for CoverCapability {
    fn device_address(&self) -> Address {
        self.device_address
    }

    fn decode_impl(&mut self, message: &EepMessage) {
        if message.message_type.as_ref().map(|t| t.id) != Some(REPLY_POSITION_AND_ANGLE) {
            return;
        }

        let position = message.entities.get(observable::POSITION);
        if let Some(entity) = position {
            if let Some(value) = &entity.value {
                self.emit(observable::POSITION, value.clone(), entity.unit.clone());
            }
        }
        if let Some(entity) = message.entities.get(observable::ANGLE) {
            if let Some(value) = &entity.value {
                self.emit(observable::ANGLE, value.clone(), entity.unit.clone());
            }
        }

        let Some(position) = position.and_then(|e| e.value.as_ref()).and_then(EepValue::as_f64) else {
            return;
        };
        if !(0.0..=100.0).contains(&position) {
            return;
        }

        let state = CoverState::derive(position, self.last_position);
        self.last_position = Some(position);

        let Some(state) = state else {
            return;
        };
        self.emit(observable::COVER_STATE, state_value(state), None);
        if state.is_moving() {
            self.arm_watchdog();
        } else {
            self.cancel_watchdog();
        }
    }
}

impl Drop for CoverCapability {
    fn drop(&mut self) {
        self.cancel_watchdog();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::collecting_sink;
    use crate::state_change::StateChange;
    use enocean_protocol::{EepMessageValue, MessageType};
    use parking_lot::Mutex;
    use std::sync::Arc;

    const WATCHDOG: Duration = Duration::from_secs(5);

    fn device() -> Address {
        Address::from_u32(0x0512_3456)
    }

    fn report(position: u64, message_type: u64) -> EepMessage {
        let mut message = EepMessage::new(Some(device()), None);
        message.message_type = Some(MessageType {
            id: message_type,
            description: "Reply position and angle".to_string(),
        });
        for (uid, raw) in [(observable::POSITION, position), (observable::ANGLE, 0)] {
            message.entities.insert(
                uid.to_string(),
                EepMessageValue {
                    raw,
                    value: Some(EepValue::Number(raw as f64)),
                    unit: Some("%".to_string()),
                },
            );
        }
        message
    }

    fn states(seen: &Arc<Mutex<Vec<StateChange>>>) -> Vec<(String, StateChangeSource)> {
        seen.lock()
            .iter()
            .filter(|c| c.observable_uid == observable::COVER_STATE)
            .map(|c| (c.value.to_string(), c.source))
            .collect()
    }

    #[test]
    fn test_derive_state() {
        assert_eq!(CoverState::derive(0.0, None), Some(CoverState::Open));
        assert_eq!(CoverState::derive(100.0, Some(20.0)), Some(CoverState::Closed));
        assert_eq!(CoverState::derive(30.0, None), None);
        assert_eq!(CoverState::derive(50.0, Some(30.0)), Some(CoverState::Closing));
        assert_eq!(CoverState::derive(10.0, Some(30.0)), Some(CoverState::Opening));
        assert_eq!(CoverState::derive(30.0, Some(30.0)), Some(CoverState::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_report_emits_no_state() {
        let (sink, seen) = collecting_sink();
        let mut cover = CoverCapability::with_watchdog(device(), sink, WATCHDOG);
        cover.decode(&report(30, 4));

        let uids: Vec<&str> = seen.lock().iter().map(|c| c.observable_uid).collect();
        assert_eq!(uids, vec![observable::POSITION, observable::ANGLE]);
        assert!(!cover.watchdog_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_then_watchdog_reports_stopped_once() {
        let (sink, seen) = collecting_sink();
        let mut cover = CoverCapability::with_watchdog(device(), sink, WATCHDOG);
        cover.decode(&report(30, 4));
        cover.decode(&report(50, 4));
        assert_eq!(states(&seen), vec![("closing".to_string(), StateChangeSource::Telegram)]);
        assert!(cover.watchdog_armed());

        tokio::time::sleep(WATCHDOG + Duration::from_millis(10)).await;
        tokio::time::sleep(WATCHDOG * 2).await;
        assert_eq!(
            states(&seen),
            vec![
                ("closing".to_string(), StateChangeSource::Telegram),
                ("stopped".to_string(), StateChangeSource::Timer),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_position_is_stopped_without_watchdog() {
        let (sink, seen) = collecting_sink();
        let mut cover = CoverCapability::with_watchdog(device(), sink, WATCHDOG);
        cover.decode(&report(20, 4));
        cover.decode(&report(20, 4));
        assert_eq!(states(&seen), vec![("stopped".to_string(), StateChangeSource::Telegram)]);
        assert!(!cover.watchdog_armed());

        tokio::time::sleep(WATCHDOG * 2).await;
        assert_eq!(states(&seen).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_report_rearms_watchdog() {
        let (sink, seen) = collecting_sink();
        let mut cover = CoverCapability::with_watchdog(device(), sink, WATCHDOG);
        cover.decode(&report(20, 4));
        cover.decode(&report(40, 4));

        tokio::time::sleep(Duration::from_secs(3)).await;
        cover.decode(&report(60, 4));

        // first deadline passes without a timer event
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(states(&seen).iter().all(|(_, source)| *source == StateChangeSource::Telegram));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let timer_events = states(&seen)
            .into_iter()
            .filter(|(_, source)| *source == StateChangeSource::Timer)
            .count();
        assert_eq!(timer_events, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_positions_cancel_watchdog() {
        let (sink, seen) = collecting_sink();
        let mut cover = CoverCapability::with_watchdog(device(), sink, WATCHDOG);
        cover.decode(&report(40, 4));
        cover.decode(&report(70, 4));
        assert!(cover.watchdog_armed());
        cover.decode(&report(100, 4));
        assert!(!cover.watchdog_armed());

        tokio::time::sleep(WATCHDOG * 2).await;
        assert_eq!(
            states(&seen),
            vec![
                ("closing".to_string(), StateChangeSource::Telegram),
                ("closed".to_string(), StateChangeSource::Telegram),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_message_types_and_senders_ignored() {
        let (sink, seen) = collecting_sink();
        let mut cover = CoverCapability::with_watchdog(device(), sink, WATCHDOG);
        cover.decode(&report(30, 1));
        let mut foreign = report(30, 4);
        foreign.sender = Some(Address::from_u32(0x0999_0000));
        cover.decode(&foreign);
        assert!(seen.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_watchdog() {
        let (sink, seen) = collecting_sink();
        let mut cover = CoverCapability::with_watchdog(device(), sink, WATCHDOG);
        cover.decode(&report(30, 4));
        cover.decode(&report(10, 4));
        drop(cover);

        tokio::time::sleep(WATCHDOG * 2).await;
        assert_eq!(states(&seen), vec![("opening".to_string(), StateChangeSource::Telegram)]);
    }
}
