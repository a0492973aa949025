use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{AlarmKind, AlarmState, AlarmTime, RingIntensity};
use crate::clock::{hour_minute, Clock};
use crate::error::{StoreError, TickError, ValidationError};
use crate::storage::migrations::{self, keys, ALARM_NAMESPACE};
use crate::storage::{AlarmConfig, SettingsStore};
use crate::ticks::{TickSource, TimerHandle};

type IntensityCallback = Box<dyn FnMut(RingIntensity)>;
type Callback = Box<dyn FnMut()>;
type DismissCallback = Box<dyn FnMut(AlarmKind)>;

/// Stored wake-up alarm settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeUpAlarm {
    pub hour: u32,
    pub minute: u32,
    pub intensity: RingIntensity,
}

#[derive(Debug, Default)]
struct WakeUpLine {
    time: Option<AlarmTime>,
    intensity: RingIntensity,
    state: AlarmState,
    snooze_until: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
struct SleepLine {
    time: Option<AlarmTime>,
    state: AlarmState,
    snooze_until: Option<NaiveDateTime>,
    reminder_sent: bool,
    /// Latched at the sleep minute so the window opens once per day.
    audio_fired: bool,
    /// Set while the soothing-audio window is open.
    audio_started_at: Option<NaiveDateTime>,
}

impl SleepLine {
    fn clear_transient(&mut self) {
        self.reminder_sent = false;
        self.audio_fired = false;
        self.audio_started_at = None;
    }
}

/// Owns both alarm lines, their persisted configuration and the news flag.
///
/// Callbacks are single-subscriber: registering a handler replaces the
/// previous one. They run synchronously inside the mutating call, after the
/// state change, and are expected to defer real work onto the application
/// task (see [`Dispatcher`](crate::events::Dispatcher)).
pub struct AlarmManager {
    wake_up: WakeUpLine,
    sleep: SleepLine,
    news_broadcasting: bool,
    clock: Arc<dyn Clock>,
    store: Box<dyn SettingsStore>,
    config: AlarmConfig,
    timer: Option<TimerHandle>,

    on_wake_up_triggered: Option<IntensityCallback>,
    on_sleep_reminder: Option<Callback>,
    on_sleep_start: Option<Callback>,
    on_sleep_stop: Option<Callback>,
    on_alarm_dismissed: Option<DismissCallback>,
}

impl AlarmManager {
    /// Load persisted configuration (migrating legacy keys) and return a
    /// manager whose check timer is not yet armed.
    pub fn new(clock: Arc<dyn Clock>, store: Box<dyn SettingsStore>, config: AlarmConfig) -> Self {
        let mut manager = Self {
            wake_up: WakeUpLine::default(),
            sleep: SleepLine::default(),
            news_broadcasting: false,
            clock,
            store,
            config,
            timer: None,
            on_wake_up_triggered: None,
            on_sleep_reminder: None,
            on_sleep_start: None,
            on_sleep_stop: None,
            on_alarm_dismissed: None,
        };
        if let Err(e) = manager.load_config() {
            tracing::error!(error = %e, "failed to load alarm config, using defaults");
            manager.wake_up = WakeUpLine::default();
            manager.sleep = SleepLine::default();
        }
        manager
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Arm the periodic alarm check.
    ///
    /// # Errors
    /// Returns the tick source error; the manager stays unarmed.
    pub fn start(&mut self, ticks: &mut dyn TickSource) -> Result<(), TickError> {
        let period = StdDuration::from_secs(self.config.check_interval_secs);
        match ticks.start_periodic(TimerHandle::AlarmCheck, period) {
            Ok(()) => {
                self.timer = Some(TimerHandle::AlarmCheck);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to arm alarm check timer");
                self.timer = None;
                Err(e)
            }
        }
    }

    pub fn shutdown(&mut self, ticks: &mut dyn TickSource) {
        if let Some(handle) = self.timer.take() {
            ticks.stop(handle);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Set the wake-up time. Forces the line to `Enabled` and clears any snooze.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidTime`] for out-of-range input; nothing
    /// changes in that case.
    pub fn set_wake_up_alarm(
        &mut self,
        hour: i32,
        minute: i32,
        intensity: RingIntensity,
    ) -> Result<(), ValidationError> {
        let time = AlarmTime::new(hour, minute).inspect_err(|_| {
            tracing::error!(hour, minute, "invalid wake up alarm time");
        })?;

        self.wake_up.time = Some(time);
        self.wake_up.intensity = intensity;
        self.wake_up.state = AlarmState::Enabled;
        self.wake_up.snooze_until = None;

        self.save_config();
        tracing::info!(%time, intensity = intensity.as_str(), "wake up alarm set");
        Ok(())
    }

    /// Set the sleep time. Forces the line to `Enabled` and resets the
    /// reminder latch and audio window.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidTime`] for out-of-range input; nothing
    /// changes in that case.
    pub fn set_sleep_alarm(&mut self, hour: i32, minute: i32) -> Result<(), ValidationError> {
        let time = AlarmTime::new(hour, minute).inspect_err(|_| {
            tracing::error!(hour, minute, "invalid sleep alarm time");
        })?;

        self.sleep.time = Some(time);
        self.sleep.state = AlarmState::Enabled;
        self.sleep.snooze_until = None;
        self.sleep.clear_transient();

        self.save_config();
        tracing::info!(%time, "sleep alarm set");
        Ok(())
    }

    /// `None` until a wake-up time has been set.
    pub fn wake_up_alarm(&self) -> Option<WakeUpAlarm> {
        self.wake_up.time.map(|t| WakeUpAlarm {
            hour: t.hour(),
            minute: t.minute(),
            intensity: self.wake_up.intensity,
        })
    }

    /// `None` until a sleep time has been set.
    pub fn sleep_alarm(&self) -> Option<AlarmTime> {
        self.sleep.time
    }

    /// Returns `false` (and changes nothing) when enabling a line that has
    /// no time set.
    pub fn enable_wake_up_alarm(&mut self, enable: bool) -> bool {
        if enable {
            if self.wake_up.time.is_none() {
                tracing::warn!("cannot enable wake up alarm: time not set");
                return false;
            }
            self.wake_up.state = AlarmState::Enabled;
        } else {
            self.wake_up.state = AlarmState::Disabled;
            self.wake_up.snooze_until = None;
        }
        self.save_config();
        tracing::info!(enable, "wake up alarm toggled");
        true
    }

    /// Returns `false` (and changes nothing) when enabling a line that has
    /// no time set.
    pub fn enable_sleep_alarm(&mut self, enable: bool) -> bool {
        if enable {
            if self.sleep.time.is_none() {
                tracing::warn!("cannot enable sleep alarm: time not set");
                return false;
            }
            self.sleep.state = AlarmState::Enabled;
            self.sleep.reminder_sent = false;
        } else {
            self.sleep.state = AlarmState::Disabled;
            self.sleep.snooze_until = None;
            self.sleep.clear_transient();
        }
        self.save_config();
        tracing::info!(enable, "sleep alarm toggled");
        true
    }

    // ── Ringing control ──────────────────────────────────────────────

    /// Dismiss every ringing line. Returns whether anything was dismissed.
    pub fn dismiss_alarm(&mut self) -> bool {
        let mut dismissed = false;

        if self.wake_up.state == AlarmState::Ringing {
            self.wake_up.state = AlarmState::Disabled;
            self.wake_up.snooze_until = None;
            if let Some(cb) = self.on_alarm_dismissed.as_mut() {
                cb(AlarmKind::WakeUp);
            }
            self.save_config();
            tracing::info!("wake up alarm dismissed");
            dismissed = true;
        }

        if self.sleep.state == AlarmState::Ringing {
            self.sleep.state = AlarmState::Disabled;
            self.sleep.snooze_until = None;
            self.sleep.clear_transient();
            if let Some(cb) = self.on_alarm_dismissed.as_mut() {
                cb(AlarmKind::Sleep);
            }
            self.save_config();
            tracing::info!("sleep alarm dismissed");
            dismissed = true;
        }

        dismissed
    }

    /// Snooze every ringing line for `minutes`. Returns whether anything was
    /// snoozed.
    pub fn snooze_alarm(&mut self, minutes: u32) -> bool {
        let until = self.clock.now() + Duration::minutes(i64::from(minutes));
        let mut snoozed = false;

        if self.wake_up.state == AlarmState::Ringing {
            self.wake_up.snooze_until = Some(until);
            self.wake_up.state = AlarmState::Snoozed;
            self.save_config();
            tracing::info!(minutes, "wake up alarm snoozed");
            snoozed = true;
        }

        if self.sleep.state == AlarmState::Ringing {
            self.sleep.snooze_until = Some(until);
            self.sleep.state = AlarmState::Snoozed;
            self.sleep.clear_transient();
            self.save_config();
            tracing::info!(minutes, "sleep alarm snoozed");
            snoozed = true;
        }

        snoozed
    }

    /// Evaluate both lines against the current wall-clock time.
    ///
    /// Called by the check timer. Several conditions can fire in one call;
    /// each is guarded by its own state or latch so repeated calls within
    /// the same minute are harmless.
    pub fn check_alarms(&mut self) {
        let now = self.clock.now();
        let (hour, minute) = hour_minute(now);

        match self.wake_up.state {
            AlarmState::Enabled => {
                if self.wake_up.time.is_some_and(|t| t.matches(hour, minute)) {
                    self.wake_up.state = AlarmState::Ringing;
                    self.fire_wake_up();
                    tracing::info!(hour, minute, "wake up alarm triggered");
                }
            }
            AlarmState::Snoozed => {
                if self.wake_up.snooze_until.map_or(true, |until| now >= until) {
                    self.wake_up.state = AlarmState::Ringing;
                    self.wake_up.snooze_until = None;
                    self.fire_wake_up();
                    tracing::info!("wake up alarm snooze expired, ringing again");
                }
            }
            AlarmState::Disabled | AlarmState::Ringing => {}
        }

        match (self.sleep.state, self.sleep.time) {
            (AlarmState::Enabled, Some(sleep_at)) => {
                let remind_at = sleep_at.minus_minutes(self.config.sleep_reminder_lead_minutes);
                if remind_at.matches(hour, minute) {
                    if !self.sleep.reminder_sent {
                        self.sleep.reminder_sent = true;
                        if let Some(cb) = self.on_sleep_reminder.as_mut() {
                            cb();
                        }
                        tracing::info!(%remind_at, "sleep reminder sent");
                    }
                } else {
                    // Re-arm for tomorrow once the reminder minute has passed.
                    self.sleep.reminder_sent = false;
                }

                if sleep_at.matches(hour, minute) {
                    if !self.sleep.audio_fired {
                        self.sleep.audio_fired = true;
                        self.sleep.audio_started_at = Some(now);
                        if let Some(cb) = self.on_sleep_start.as_mut() {
                            cb();
                        }
                        tracing::info!(%sleep_at, "sleep audio started");
                    }
                } else {
                    self.sleep.audio_fired = false;
                }

                if let Some(started) = self.sleep.audio_started_at {
                    if (now - started).num_seconds() >= self.config.sleep_audio_secs {
                        self.sleep.audio_started_at = None;
                        if let Some(cb) = self.on_sleep_stop.as_mut() {
                            cb();
                        }
                        tracing::info!("sleep audio stopped");
                    }
                }
            }
            (AlarmState::Snoozed, _) => {
                if self.sleep.snooze_until.map_or(true, |until| now >= until) {
                    self.sleep.state = AlarmState::Ringing;
                    self.sleep.snooze_until = None;
                    if let Some(cb) = self.on_sleep_reminder.as_mut() {
                        cb();
                    }
                    tracing::info!("sleep alarm snooze expired, reminding again");
                }
            }
            _ => {}
        }
    }

    fn fire_wake_up(&mut self) {
        let intensity = self.wake_up.intensity;
        if let Some(cb) = self.on_wake_up_triggered.as_mut() {
            cb(intensity);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn wake_up_state(&self) -> AlarmState {
        self.wake_up.state
    }

    pub fn sleep_state(&self) -> AlarmState {
        self.sleep.state
    }

    pub fn wake_up_snooze_until(&self) -> Option<NaiveDateTime> {
        self.wake_up.snooze_until
    }

    pub fn sleep_snooze_until(&self) -> Option<NaiveDateTime> {
        self.sleep.snooze_until
    }

    pub fn sleep_reminder_sent(&self) -> bool {
        self.sleep.reminder_sent
    }

    pub fn is_sleep_audio_playing(&self) -> bool {
        self.sleep.audio_started_at.is_some()
    }

    pub fn is_ringing(&self) -> bool {
        self.wake_up.state == AlarmState::Ringing || self.sleep.state == AlarmState::Ringing
    }

    // ── Callbacks ────────────────────────────────────────────────────

    pub fn on_wake_up_alarm_triggered(&mut self, callback: impl FnMut(RingIntensity) + 'static) {
        self.on_wake_up_triggered = Some(Box::new(callback));
    }

    pub fn on_sleep_alarm_reminder(&mut self, callback: impl FnMut() + 'static) {
        self.on_sleep_reminder = Some(Box::new(callback));
    }

    pub fn on_sleep_alarm_start(&mut self, callback: impl FnMut() + 'static) {
        self.on_sleep_start = Some(Box::new(callback));
    }

    pub fn on_sleep_alarm_stop(&mut self, callback: impl FnMut() + 'static) {
        self.on_sleep_stop = Some(Box::new(callback));
    }

    pub fn on_alarm_dismissed(&mut self, callback: impl FnMut(AlarmKind) + 'static) {
        self.on_alarm_dismissed = Some(Box::new(callback));
    }

    // ── News ─────────────────────────────────────────────────────────

    pub fn start_news_broadcast(&mut self) {
        self.news_broadcasting = true;
        tracing::info!("news broadcast started");
    }

    pub fn stop_news_broadcast(&mut self) {
        self.news_broadcasting = false;
        tracing::info!("news broadcast stopped");
    }

    pub fn is_news_broadcasting(&self) -> bool {
        self.news_broadcasting
    }

    // ── Persistence ──────────────────────────────────────────────────

    fn save_config(&mut self) {
        if let Err(e) = self.write_config() {
            tracing::error!(error = %e, "failed to persist alarm config");
        }
    }

    fn write_config(&mut self) -> Result<(), StoreError> {
        let (wake_hour, wake_min) = stored_time(self.wake_up.time);
        let (sleep_hour, sleep_min) = stored_time(self.sleep.time);
        let values = [
            (keys::WAKE_HOUR, wake_hour),
            (keys::WAKE_MINUTE, wake_min),
            (keys::WAKE_INTENSITY, self.wake_up.intensity.to_stored()),
            (keys::WAKE_STATE, self.wake_up.state.to_stored()),
            (keys::WAKE_SNOOZE_UNTIL, stored_instant(self.wake_up.snooze_until)),
            (keys::SLEEP_HOUR, sleep_hour),
            (keys::SLEEP_MINUTE, sleep_min),
            (keys::SLEEP_STATE, self.sleep.state.to_stored()),
            (keys::SLEEP_SNOOZE_UNTIL, stored_instant(self.sleep.snooze_until)),
        ];
        for (key, value) in values {
            self.store.set_int(ALARM_NAMESPACE, key, value)?;
        }
        Ok(())
    }

    fn load_config(&mut self) -> Result<(), StoreError> {
        migrations::migrate(self.store.as_mut())?;
        let get = |key: &str| self.store.get_int(ALARM_NAMESPACE, key);

        let wake_time = loaded_time(get(keys::WAKE_HOUR)?, get(keys::WAKE_MINUTE)?);
        self.wake_up = WakeUpLine {
            time: wake_time,
            intensity: RingIntensity::from_stored(get(keys::WAKE_INTENSITY)?.unwrap_or(0)),
            state: loaded_state(wake_time, get(keys::WAKE_STATE)?),
            snooze_until: loaded_instant(get(keys::WAKE_SNOOZE_UNTIL)?),
        };

        let sleep_time = loaded_time(get(keys::SLEEP_HOUR)?, get(keys::SLEEP_MINUTE)?);
        self.sleep = SleepLine {
            time: sleep_time,
            state: loaded_state(sleep_time, get(keys::SLEEP_STATE)?),
            snooze_until: loaded_instant(get(keys::SLEEP_SNOOZE_UNTIL)?),
            ..SleepLine::default()
        };

        tracing::info!(
            wake_up = ?self.wake_up.time.map(|t| t.to_string()),
            wake_up_state = ?self.wake_up.state,
            sleep = ?self.sleep.time.map(|t| t.to_string()),
            sleep_state = ?self.sleep.state,
            "loaded alarm config"
        );
        Ok(())
    }
}

/// Unset times are stored as -1.
fn stored_time(time: Option<AlarmTime>) -> (i64, i64) {
    time.map_or((-1, -1), |t| (i64::from(t.hour()), i64::from(t.minute())))
}

/// Absent instants are stored as 0.
fn stored_instant(at: Option<NaiveDateTime>) -> i64 {
    at.map_or(0, |t| t.and_utc().timestamp())
}

fn loaded_time(hour: Option<i64>, minute: Option<i64>) -> Option<AlarmTime> {
    let hour = i32::try_from(hour?).ok()?;
    let minute = i32::try_from(minute?).ok()?;
    AlarmTime::new(hour, minute).ok()
}

fn loaded_instant(secs: Option<i64>) -> Option<NaiveDateTime> {
    secs.filter(|s| *s > 0)
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|t| t.naive_utc())
}

/// A line without a valid time is always `Disabled`; a ring in progress is
/// not resumed across restarts.
fn loaded_state(time: Option<AlarmTime>, stored: Option<i64>) -> AlarmState {
    if time.is_none() {
        return AlarmState::Disabled;
    }
    match AlarmState::from_stored(stored.unwrap_or(0)) {
        AlarmState::Ringing => AlarmState::Enabled,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn clock() -> ManualClock {
        ManualClock::at(NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(), 6, 0)
    }

    fn manager(clock: &ManualClock) -> AlarmManager {
        AlarmManager::new(
            Arc::new(clock.clone()),
            Box::new(MemoryStore::new()),
            AlarmConfig::default(),
        )
    }

    #[test]
    fn fresh_manager_is_unset_and_disabled() {
        let m = manager(&clock());
        assert_eq!(m.wake_up_alarm(), None);
        assert_eq!(m.sleep_alarm(), None);
        assert_eq!(m.wake_up_state(), AlarmState::Disabled);
        assert_eq!(m.sleep_state(), AlarmState::Disabled);
        assert!(!m.is_news_broadcasting());
    }

    #[test]
    fn enabling_without_time_is_a_noop() {
        let mut m = manager(&clock());
        assert!(!m.enable_wake_up_alarm(true));
        assert!(!m.enable_sleep_alarm(true));
        assert_eq!(m.wake_up_state(), AlarmState::Disabled);
        assert_eq!(m.sleep_state(), AlarmState::Disabled);
    }

    #[test]
    fn disable_then_enable_keeps_time() {
        let mut m = manager(&clock());
        m.set_wake_up_alarm(7, 15, RingIntensity::Strong).unwrap();
        assert!(m.enable_wake_up_alarm(false));
        assert_eq!(m.wake_up_state(), AlarmState::Disabled);
        assert!(m.enable_wake_up_alarm(true));
        assert_eq!(m.wake_up_state(), AlarmState::Enabled);
        assert_eq!(
            m.wake_up_alarm(),
            Some(WakeUpAlarm {
                hour: 7,
                minute: 15,
                intensity: RingIntensity::Strong
            })
        );
    }

    #[test]
    fn disabled_line_does_not_fire() {
        let clock = clock();
        let mut m = manager(&clock);
        m.set_wake_up_alarm(6, 1, RingIntensity::Gentle).unwrap();
        m.enable_wake_up_alarm(false);
        clock.advance_to(6, 1);
        m.check_alarms();
        assert_eq!(m.wake_up_state(), AlarmState::Disabled);
    }

    #[test]
    fn missed_minute_does_not_fire_late() {
        let clock = clock();
        let mut m = manager(&clock);
        m.set_wake_up_alarm(6, 5, RingIntensity::Gentle).unwrap();
        clock.advance_to(6, 6);
        m.check_alarms();
        assert_eq!(m.wake_up_state(), AlarmState::Enabled);
    }

    #[test]
    fn callbacks_are_last_registration_wins() {
        use std::cell::Cell;
        use std::rc::Rc;

        let clock = clock();
        let mut m = manager(&clock);
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let f = first.clone();
        m.on_wake_up_alarm_triggered(move |_| f.set(f.get() + 1));
        let s = second.clone();
        m.on_wake_up_alarm_triggered(move |_| s.set(s.get() + 1));

        m.set_wake_up_alarm(6, 0, RingIntensity::Gentle).unwrap();
        m.check_alarms();
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn stored_state_normalization() {
        let t = AlarmTime::new(7, 0).ok();
        assert_eq!(loaded_state(None, Some(1)), AlarmState::Disabled);
        assert_eq!(loaded_state(t, Some(2)), AlarmState::Enabled);
        assert_eq!(loaded_state(t, Some(3)), AlarmState::Snoozed);
        assert_eq!(loaded_state(t, None), AlarmState::Disabled);
    }

    #[test]
    fn instants_roundtrip_through_store_encoding() {
        let at = NaiveDate::from_ymd_opt(2026, 5, 4)
            .unwrap()
            .and_hms_opt(7, 5, 0)
            .unwrap();
        assert_eq!(loaded_instant(Some(stored_instant(Some(at)))), Some(at));
        assert_eq!(loaded_instant(Some(stored_instant(None))), None);
    }

    #[test]
    fn news_flag_toggles() {
        let mut m = manager(&clock());
        m.start_news_broadcast();
        assert!(m.is_news_broadcasting());
        m.stop_news_broadcast();
        assert!(!m.is_news_broadcasting());
    }
}
