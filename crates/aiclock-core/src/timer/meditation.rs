//! Meditation countdown: `Idle -> Running -> Idle`.

use serde::{Deserialize, Serialize};

use super::countdown::{format_mm_ss, split_mm_ss, Countdown};
use super::TickCallback;
use crate::error::TickError;
use crate::events::{AudioCue, Dispatcher, Effect};
use crate::storage::MeditationConfig;
use crate::ticks::{TickSource, TimerHandle};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeditationState {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeditationStatus {
    pub is_running: bool,
    pub state: MeditationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
}

pub struct MeditationTimer {
    state: MeditationState,
    duration_minutes: u32,
    countdown: Countdown,
    on_tick: Option<TickCallback>,
    config: MeditationConfig,
    dispatcher: Dispatcher,
}

impl MeditationTimer {
    pub fn new(config: MeditationConfig, dispatcher: Dispatcher) -> Self {
        Self {
            state: MeditationState::Idle,
            duration_minutes: config.default_minutes,
            countdown: Countdown::new(TimerHandle::Meditation),
            on_tick: None,
            config,
            dispatcher,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == MeditationState::Running
    }

    pub fn state(&self) -> MeditationState {
        self.state
    }

    /// Length of the current (or last) session.
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn status(&self) -> MeditationStatus {
        let remaining = self.is_running().then(|| split_mm_ss(self.remaining_secs()));
        MeditationStatus {
            is_running: self.is_running(),
            state: self.state,
            remaining_minutes: remaining.map(|(m, _)| m),
            remaining_seconds: remaining.map(|(_, s)| s),
        }
    }

    /// Start a session. A duration of 0 uses the configured default; any
    /// other value is taken as given, bounds are the caller's job.
    ///
    /// Returns `Ok(false)` without touching anything if already running.
    ///
    /// # Errors
    /// If the tick source cannot arm the countdown the timer stays `Idle`.
    pub fn start(
        &mut self,
        ticks: &mut dyn TickSource,
        duration_minutes: u32,
        on_tick: Option<TickCallback>,
    ) -> Result<bool, TickError> {
        if self.is_running() {
            tracing::warn!("meditation already running");
            return Ok(false);
        }

        self.duration_minutes = if duration_minutes > 0 {
            duration_minutes
        } else {
            self.config.default_minutes
        };

        if let Err(e) = self
            .countdown
            .arm(ticks, self.duration_minutes.saturating_mul(60))
        {
            tracing::error!(error = %e, "failed to arm meditation timer");
            return Err(e);
        }

        self.state = MeditationState::Running;
        self.on_tick = on_tick;
        tracing::info!(minutes = self.duration_minutes, "meditation started");
        Ok(true)
    }

    /// Cancel without completion side effects. Returns `false` if idle.
    pub fn stop(&mut self, ticks: &mut dyn TickSource) -> bool {
        if !self.is_running() {
            tracing::warn!("meditation not running");
            return false;
        }
        self.state = MeditationState::Idle;
        self.countdown.cancel(ticks);
        tracing::info!("meditation stopped");
        true
    }

    /// One-second tick from [`TimerHandle::Meditation`].
    pub fn on_tick(&mut self, ticks: &mut dyn TickSource) {
        if !self.is_running() || !self.countdown.is_armed() {
            return;
        }

        let remaining = self.countdown.step();
        let (minutes, seconds) = split_mm_ss(remaining);

        if let Some(cb) = self.on_tick.as_mut() {
            cb(minutes, seconds);
        }

        self.dispatcher.schedule_all([
            Effect::status("冥想中"),
            Effect::emotion("moon"),
            Effect::system_message(format_mm_ss(minutes, seconds)),
        ]);

        if remaining == 0 {
            self.on_timer_complete(ticks);
        }
    }

    fn on_timer_complete(&mut self, ticks: &mut dyn TickSource) {
        self.state = MeditationState::Idle;
        self.countdown.cancel(ticks);

        self.dispatcher.schedule_all([
            Effect::Play {
                cue: AudioCue::Welcome,
            },
            Effect::status("冥想结束"),
            Effect::emotion("neutral"),
            Effect::system_message("冥想时间到了"),
        ]);
        tracing::info!(minutes = self.duration_minutes, "meditation complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::ManualTicks;

    fn timer() -> (MeditationTimer, ManualTicks, Dispatcher) {
        let dispatcher = Dispatcher::new();
        let timer = MeditationTimer::new(MeditationConfig::default(), dispatcher.clone());
        (timer, ManualTicks::new(), dispatcher)
    }

    #[test]
    fn zero_duration_uses_default() {
        let (mut t, mut ticks, _) = timer();
        assert!(t.start(&mut ticks, 0, None).unwrap());
        assert_eq!(t.remaining_secs(), 600);
        assert_eq!(t.duration_minutes(), 10);
    }

    #[test]
    fn explicit_duration_is_used_as_given() {
        let (mut t, mut ticks, _) = timer();
        t.start(&mut ticks, 5, None).unwrap();
        assert_eq!(t.remaining_secs(), 300);
    }

    #[test]
    fn stop_has_no_completion_effects() {
        let (mut t, mut ticks, dispatcher) = timer();
        t.start(&mut ticks, 1, None).unwrap();
        assert!(t.stop(&mut ticks));
        assert!(dispatcher.is_empty());
        assert!(!ticks.is_armed(TimerHandle::Meditation));
        assert_eq!(t.status().remaining_minutes, None);
    }

    #[test]
    fn failed_arm_stays_idle() {
        let (mut t, mut ticks, _) = timer();
        ticks.fail_next_start(TimerHandle::Meditation);
        assert!(t.start(&mut ticks, 3, None).is_err());
        assert_eq!(t.state(), MeditationState::Idle);
    }

    #[test]
    fn status_while_running() {
        let (mut t, mut ticks, _) = timer();
        t.start(&mut ticks, 2, None).unwrap();
        t.on_tick(&mut ticks);
        let status = t.status();
        assert!(status.is_running);
        assert_eq!(status.remaining_minutes, Some(1));
        assert_eq!(status.remaining_seconds, Some(59));
    }
}
