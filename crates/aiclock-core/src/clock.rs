//! Wall-clock abstraction.
//!
//! The platform supplies local time; this crate never deals with timezones.
//! Components read the clock through [`Clock`] so tests can drive simulated
//! time with [`ManualClock`].

use std::sync::{Arc, Mutex};

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for simulations and tests. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Clock at `hour:minute:00` on the given day. Out-of-range values fall
    /// back to midnight.
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let time = date
            .and_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| date.and_time(NaiveTime::default()));
        Self::new(time)
    }

    pub fn set(&self, to: NaiveDateTime) {
        *self.lock() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    /// Jump to `hour:minute:00` today, or tomorrow if that time has passed.
    pub fn advance_to(&self, hour: u32, minute: u32) {
        let mut now = self.lock();
        let Some(target) = now.date().and_hms_opt(hour, minute, 0) else {
            return;
        };
        *now = if target < *now {
            target + Duration::days(1)
        } else {
            target
        };
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}

/// `(hour, minute)` of a wall-clock instant.
pub(crate) fn hour_minute(t: NaiveDateTime) -> (u32, u32) {
    (t.hour(), t.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn clones_share_time() {
        let a = ManualClock::at(day(), 8, 0);
        let b = a.clone();
        a.advance_secs(90);
        assert_eq!(hour_minute(b.now()), (8, 1));
        assert_eq!(b.now().second(), 30);
    }

    #[test]
    fn advance_to_rolls_into_next_day() {
        let clock = ManualClock::at(day(), 23, 0);
        clock.advance_to(6, 30);
        assert_eq!(clock.today(), day().succ_opt().unwrap());
        assert_eq!(hour_minute(clock.now()), (6, 30));
    }
}
