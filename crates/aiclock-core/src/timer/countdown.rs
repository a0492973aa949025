//! One-second countdown shared by the pomodoro and meditation timers.
//!
//! Owns the [`TimerHandle`] while armed. Cancelling clears the handle before
//! the host timer is stopped, so a tick that was already queued finds the
//! countdown unarmed and does nothing.

use std::time::Duration;

use crate::error::TickError;
use crate::ticks::{TickSource, TimerHandle};

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub(crate) struct Countdown {
    handle: TimerHandle,
    armed: bool,
    remaining_secs: u32,
}

impl Countdown {
    pub(crate) fn new(handle: TimerHandle) -> Self {
        Self {
            handle,
            armed: false,
            remaining_secs: 0,
        }
    }

    /// (Re)arm with `total_secs` to go.
    pub(crate) fn arm(&mut self, ticks: &mut dyn TickSource, total_secs: u32) -> Result<(), TickError> {
        self.remaining_secs = total_secs;
        match ticks.start_periodic(self.handle, TICK_PERIOD) {
            Ok(()) => {
                self.armed = true;
                Ok(())
            }
            Err(e) => {
                // A failed re-arm must not leave the previous period running.
                self.armed = false;
                ticks.stop(self.handle);
                Err(e)
            }
        }
    }

    pub(crate) fn cancel(&mut self, ticks: &mut dyn TickSource) {
        if std::mem::take(&mut self.armed) {
            ticks.stop(self.handle);
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed
    }

    pub(crate) fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Count down one second and return what is left.
    pub(crate) fn step(&mut self) -> u32 {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.remaining_secs
    }
}

/// `(minutes, seconds)` of a remaining-seconds count.
pub(crate) fn split_mm_ss(secs: u32) -> (u32, u32) {
    (secs / 60, secs % 60)
}

pub(crate) fn format_mm_ss(minutes: u32, seconds: u32) -> String {
    format!("{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::ManualTicks;

    #[test]
    fn arm_step_cancel() {
        let mut ticks = ManualTicks::new();
        let mut countdown = Countdown::new(TimerHandle::Meditation);
        countdown.arm(&mut ticks, 2).unwrap();
        assert!(ticks.is_armed(TimerHandle::Meditation));
        assert_eq!(ticks.period(TimerHandle::Meditation), Some(Duration::from_secs(1)));
        assert_eq!(countdown.step(), 1);
        assert_eq!(countdown.step(), 0);
        assert_eq!(countdown.step(), 0);
        countdown.cancel(&mut ticks);
        assert!(!countdown.is_armed());
        assert!(!ticks.is_armed(TimerHandle::Meditation));
    }

    #[test]
    fn failed_arm_leaves_countdown_unarmed() {
        let mut ticks = ManualTicks::new();
        ticks.fail_next_start(TimerHandle::Pomodoro);
        let mut countdown = Countdown::new(TimerHandle::Pomodoro);
        assert!(countdown.arm(&mut ticks, 60).is_err());
        assert!(!countdown.is_armed());
    }

    #[test]
    fn failed_rearm_stops_previous_period() {
        let mut ticks = ManualTicks::new();
        let mut countdown = Countdown::new(TimerHandle::Pomodoro);
        countdown.arm(&mut ticks, 60).unwrap();
        ticks.fail_next_start(TimerHandle::Pomodoro);
        assert!(countdown.arm(&mut ticks, 300).is_err());
        assert!(!ticks.is_armed(TimerHandle::Pomodoro));
    }

    #[test]
    fn formatting() {
        assert_eq!(split_mm_ss(1499), (24, 59));
        assert_eq!(format_mm_ss(5, 7), "05:07");
    }
}
