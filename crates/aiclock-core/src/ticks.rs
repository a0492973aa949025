//! Periodic tick source.
//!
//! Components never own a thread. They arm a periodic timer identified by a
//! [`TimerHandle`]; the driver (tokio loop, firmware timer task, test) calls
//! back into the owning component whenever that handle fires. Creation and
//! deletion of the host timer are folded into `start_periodic` / `stop`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TickError;

/// Identifies which component a periodic timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerHandle {
    AlarmCheck,
    Pomodoro,
    Meditation,
}

impl TimerHandle {
    pub fn name(self) -> &'static str {
        match self {
            TimerHandle::AlarmCheck => "alarm_check_timer",
            TimerHandle::Pomodoro => "pomodoro_timer",
            TimerHandle::Meditation => "meditation_timer",
        }
    }
}

/// Host periodic-timer facility.
pub trait TickSource {
    /// Arm (or re-arm) the timer. Re-arming replaces the previous period and
    /// restarts its phase.
    fn start_periodic(&mut self, handle: TimerHandle, period: Duration) -> Result<(), TickError>;

    /// Cancel the timer. Stopping a timer that is not armed is a no-op.
    fn stop(&mut self, handle: TimerHandle);
}

/// In-memory tick source that only records what is armed.
///
/// Used by simulations and tests, which fire ticks by calling the
/// component's tick method directly.
#[derive(Debug, Default)]
pub struct ManualTicks {
    armed: BTreeMap<TimerHandle, Duration>,
    /// How many times each handle has been (re)armed.
    starts: BTreeMap<TimerHandle, u32>,
    fail_next: Option<TimerHandle>,
}

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.armed.contains_key(&handle)
    }

    pub fn period(&self, handle: TimerHandle) -> Option<Duration> {
        self.armed.get(&handle).copied()
    }

    pub fn start_count(&self, handle: TimerHandle) -> u32 {
        self.starts.get(&handle).copied().unwrap_or(0)
    }

    /// Make the next `start_periodic` for `handle` fail.
    pub fn fail_next_start(&mut self, handle: TimerHandle) {
        self.fail_next = Some(handle);
    }
}

impl TickSource for ManualTicks {
    fn start_periodic(&mut self, handle: TimerHandle, period: Duration) -> Result<(), TickError> {
        if self.fail_next == Some(handle) {
            self.fail_next = None;
            return Err(TickError::StartFailed(handle.name().to_string()));
        }
        self.armed.insert(handle, period);
        *self.starts.entry(handle).or_insert(0) += 1;
        Ok(())
    }

    fn stop(&mut self, handle: TimerHandle) {
        self.armed.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearm_counts_and_stop_clears() {
        let mut ticks = ManualTicks::new();
        ticks
            .start_periodic(TimerHandle::Pomodoro, Duration::from_secs(1))
            .unwrap();
        ticks
            .start_periodic(TimerHandle::Pomodoro, Duration::from_secs(1))
            .unwrap();
        assert_eq!(ticks.start_count(TimerHandle::Pomodoro), 2);
        ticks.stop(TimerHandle::Pomodoro);
        assert!(!ticks.is_armed(TimerHandle::Pomodoro));
        ticks.stop(TimerHandle::Pomodoro);
    }

    #[test]
    fn injected_failure_is_one_shot() {
        let mut ticks = ManualTicks::new();
        ticks.fail_next_start(TimerHandle::Meditation);
        assert!(ticks
            .start_periodic(TimerHandle::Meditation, Duration::from_secs(1))
            .is_err());
        assert!(ticks
            .start_periodic(TimerHandle::Meditation, Duration::from_secs(1))
            .is_ok());
    }
}
