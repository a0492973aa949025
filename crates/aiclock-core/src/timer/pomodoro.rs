//! Pomodoro work/break cycle.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Working -> (Break | LongBreak) -> Working -> ...
//! ```
//!
//! Every completed work segment advances the loop counter; the segment that
//! completes a cycle resets it to 0 and starts a long break. Focus time is
//! accumulated per calendar day and reset lazily the first time it is touched
//! on a new day.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::countdown::{format_mm_ss, split_mm_ss, Countdown};
use super::TickCallback;
use crate::clock::Clock;
use crate::error::TickError;
use crate::events::{AudioCue, Dispatcher, Effect};
use crate::storage::PomodoroConfig;
use crate::ticks::{TickSource, TimerHandle};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PomodoroState {
    #[default]
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "working")]
    Working,
    #[serde(rename = "short_break")]
    Break,
    #[serde(rename = "long_break")]
    LongBreak,
}

impl PomodoroState {
    fn label(self) -> &'static str {
        match self {
            PomodoroState::Working => "工作中",
            PomodoroState::Break => "休息中",
            PomodoroState::LongBreak => "长休息中",
            PomodoroState::Idle => "未知",
        }
    }
}

/// Snapshot for status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroStatus {
    pub is_running: bool,
    pub state: PomodoroState,
    pub loop_count: u32,
    pub remaining_seconds: u32,
}

/// Today's accumulated focus time.
///
/// `completed_pomodoros` is `total_focus_seconds / work segment length`,
/// rounded down: segments stopped early still add up, so this is an
/// estimate rather than a count of finished segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFocusInfo {
    pub total_focus_seconds: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub formatted_time: String,
    pub completed_pomodoros: u64,
}

pub struct PomodoroTimer {
    state: PomodoroState,
    loop_count: u32,
    countdown: Countdown,
    on_tick: Option<TickCallback>,
    total_focus_secs: u64,
    stats_date: Option<NaiveDate>,
    config: PomodoroConfig,
    clock: Arc<dyn Clock>,
    dispatcher: Dispatcher,
}

impl PomodoroTimer {
    pub fn new(config: PomodoroConfig, clock: Arc<dyn Clock>, dispatcher: Dispatcher) -> Self {
        Self {
            state: PomodoroState::Idle,
            loop_count: 0,
            countdown: Countdown::new(TimerHandle::Pomodoro),
            on_tick: None,
            total_focus_secs: 0,
            stats_date: None,
            config,
            clock,
            dispatcher,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.state != PomodoroState::Idle
    }

    pub fn state(&self) -> PomodoroState {
        self.state
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn status(&self) -> PomodoroStatus {
        PomodoroStatus {
            is_running: self.is_running(),
            state: self.state,
            loop_count: self.loop_count,
            remaining_seconds: if self.is_running() {
                self.remaining_secs()
            } else {
                0
            },
        }
    }

    /// Seconds of focus accumulated today.
    pub fn total_focus_secs(&mut self) -> u64 {
        self.roll_daily_stats();
        self.total_focus_secs
    }

    pub fn daily_focus_info(&mut self) -> DailyFocusInfo {
        let total = self.total_focus_secs();
        let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
        DailyFocusInfo {
            total_focus_seconds: total,
            hours,
            minutes,
            seconds,
            formatted_time: format!("{hours:02}:{minutes:02}:{seconds:02}"),
            completed_pomodoros: total / self.work_secs().max(1) as u64,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a fresh cycle with a work segment.
    ///
    /// Returns `Ok(false)` without touching anything if already running.
    ///
    /// # Errors
    /// If the tick source cannot arm the countdown the timer stays `Idle`.
    pub fn start(
        &mut self,
        ticks: &mut dyn TickSource,
        on_tick: Option<TickCallback>,
    ) -> Result<bool, TickError> {
        if self.is_running() {
            tracing::warn!("pomodoro already running");
            return Ok(false);
        }

        self.state = PomodoroState::Working;
        self.loop_count = 0;
        self.on_tick = on_tick;

        if let Err(e) = self.arm(ticks) {
            self.state = PomodoroState::Idle;
            self.on_tick = None;
            return Err(e);
        }
        tracing::info!(work_minutes = self.config.work_minutes, "pomodoro started");
        Ok(true)
    }

    /// Stop the cycle. An interrupted work segment still counts the seconds
    /// already worked; breaks count nothing.
    ///
    /// Returns `false` if the timer was not running.
    pub fn stop(&mut self, ticks: &mut dyn TickSource) -> bool {
        if !self.is_running() {
            tracing::warn!("pomodoro not running");
            return false;
        }

        if self.state == PomodoroState::Working {
            let elapsed = self
                .duration_for_state()
                .saturating_sub(self.countdown.remaining_secs());
            self.add_focus_time(u64::from(elapsed));
        }

        self.state = PomodoroState::Idle;
        self.countdown.cancel(ticks);
        tracing::info!(focus_today_secs = self.total_focus_secs, "pomodoro stopped");
        true
    }

    /// One-second tick from [`TimerHandle::Pomodoro`].
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
            Effect::status(format!(
                "{} [{}/{}]",
                self.state.label(),
                self.loop_count,
                self.config.loops_before_long_break
            )),
            Effect::system_message(format_mm_ss(minutes, seconds)),
        ]);

        if remaining == 0 {
            self.on_timer_complete(ticks);
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn on_timer_complete(&mut self, ticks: &mut dyn TickSource) {
        match self.state {
            PomodoroState::Working => {
                self.add_focus_time(u64::from(self.work_secs()));

                self.loop_count += 1;
                if self.loop_count >= self.config.loops_before_long_break {
                    self.state = PomodoroState::LongBreak;
                    self.loop_count = 0;
                } else {
                    self.state = PomodoroState::Break;
                }

                self.dispatcher.schedule(Effect::Play {
                    cue: AudioCue::Success,
                });
                if self.state == PomodoroState::LongBreak {
                    self.dispatcher.schedule(Effect::Play {
                        cue: AudioCue::Popup,
                    });
                }
            }
            PomodoroState::Break | PomodoroState::LongBreak => {
                self.state = PomodoroState::Working;
                self.dispatcher.schedule(Effect::Play {
                    cue: AudioCue::Welcome,
                });
            }
            PomodoroState::Idle => return,
        }

        tracing::info!(state = ?self.state, loop_count = self.loop_count, "pomodoro segment complete");
        if self.arm(ticks).is_err() {
            self.state = PomodoroState::Idle;
            self.on_tick = None;
            tracing::warn!("pomodoro stopped: next segment could not be armed");
        }
    }

    fn arm(&mut self, ticks: &mut dyn TickSource) -> Result<(), TickError> {
        let total = self.duration_for_state();
        self.countdown.arm(ticks, total).inspect_err(|e| {
            tracing::error!(error = %e, "failed to arm pomodoro timer");
        })
    }

    fn work_secs(&self) -> u32 {
        self.config.work_minutes.saturating_mul(60)
    }

    fn duration_for_state(&self) -> u32 {
        let minutes = match self.state {
            PomodoroState::Working | PomodoroState::Idle => self.config.work_minutes,
            PomodoroState::Break => self.config.short_break_minutes,
            PomodoroState::LongBreak => self.config.long_break_minutes,
        };
        minutes.saturating_mul(60)
    }

    fn roll_daily_stats(&mut self) {
        let today = self.clock.today();
        if self.stats_date != Some(today) {
            if self.stats_date.is_some() {
                tracing::info!(%today, "new day, resetting focus time");
            }
            self.total_focus_secs = 0;
            self.stats_date = Some(today);
        }
    }

    fn add_focus_time(&mut self, secs: u64) {
        self.roll_daily_stats();
        self.total_focus_secs += secs;
    }
}
