//! Device orchestration: owns the components and routes ticks and effects.
//!
//! ```text
//!   TickSource ──▶ Device::on_timer ──▶ component
//!                                          │ (callbacks, effects)
//!                                          ▼
//!                                      Dispatcher ──▶ Device::flush ──▶ Sinks
//! ```
//!
//! Alarm callbacks only enqueue effects. Anything that needs the alarm
//! manager again (raising the news flag after a wake-up dismissal) goes
//! through [`Effect::StartNewsBroadcast`] and is applied on flush.

use std::sync::Arc;

use crate::alarm::{AlarmKind, AlarmManager, RingIntensity};
use crate::clock::Clock;
use crate::error::TickError;
use crate::events::{AlarmPhase, AudioCue, Dispatcher, Effect, NewsAction, Notification};
use crate::ports::Sinks;
use crate::storage::{Config, SettingsStore};
use crate::ticks::{TickSource, TimerHandle};
use crate::timer::{MeditationTimer, PomodoroTimer};

pub struct Device {
    pub(crate) alarms: AlarmManager,
    pub(crate) pomodoro: PomodoroTimer,
    pub(crate) meditation: MeditationTimer,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) config: Config,
}

impl Device {
    pub fn new(config: Config, clock: Arc<dyn Clock>, store: Box<dyn SettingsStore>) -> Self {
        let dispatcher = Dispatcher::new();
        let mut alarms = AlarmManager::new(Arc::clone(&clock), store, config.alarm.clone());
        wire_alarm_callbacks(&mut alarms, &dispatcher);

        let pomodoro = PomodoroTimer::new(config.pomodoro.clone(), clock, dispatcher.clone());
        let meditation = MeditationTimer::new(config.meditation.clone(), dispatcher.clone());

        Self {
            alarms,
            pomodoro,
            meditation,
            dispatcher,
            config,
        }
    }

    /// Arm the alarm check. Timers arm themselves when started.
    ///
    /// # Errors
    /// Returns the tick source error if the check timer cannot be armed.
    pub fn start(&mut self, ticks: &mut dyn TickSource) -> Result<(), TickError> {
        self.alarms.start(ticks)?;
        tracing::info!("device started");
        Ok(())
    }

    /// Cancel every armed timer.
    pub fn shutdown(&mut self, ticks: &mut dyn TickSource) {
        self.alarms.shutdown(ticks);
        if self.pomodoro.is_running() {
            self.pomodoro.stop(ticks);
        }
        if self.meditation.is_running() {
            self.meditation.stop(ticks);
        }
        tracing::info!("device shut down");
    }

    /// Route a fired timer to the component that owns it.
    pub fn on_timer(&mut self, handle: TimerHandle, ticks: &mut dyn TickSource) {
        match handle {
            TimerHandle::AlarmCheck => self.alarms.check_alarms(),
            TimerHandle::Pomodoro => self.pomodoro.on_tick(ticks),
            TimerHandle::Meditation => self.meditation.on_tick(ticks),
        }
    }

    /// Boot-button press: dismisses a ringing alarm. Returns whether one was
    /// ringing.
    pub fn button_press(&mut self) -> bool {
        if !self.alarms.is_ringing() {
            return false;
        }
        self.alarms.dismiss_alarm()
    }

    /// Apply queued effects in order. Returns how many were applied.
    pub fn flush<S: Sinks + ?Sized>(&mut self, sinks: &mut S) -> usize {
        let effects = self.dispatcher.drain();
        let count = effects.len();
        for effect in effects {
            match effect {
                Effect::Status { text } => sinks.set_status(&text),
                Effect::Emotion { tag } => sinks.set_emotion(&tag),
                Effect::ChatMessage { role, text } => sinks.set_chat_message(&role, &text),
                Effect::Play { cue } => sinks.play(cue),
                Effect::Notify { message } => sinks.send(&message),
                Effect::StartNewsBroadcast => self.alarms.start_news_broadcast(),
            }
        }
        count
    }

    pub fn alarms(&self) -> &AlarmManager {
        &self.alarms
    }

    pub fn alarms_mut(&mut self) -> &mut AlarmManager {
        &mut self.alarms
    }

    pub fn pomodoro(&self) -> &PomodoroTimer {
        &self.pomodoro
    }

    pub fn pomodoro_mut(&mut self) -> &mut PomodoroTimer {
        &mut self.pomodoro
    }

    pub fn meditation(&self) -> &MeditationTimer {
        &self.meditation
    }

    pub fn meditation_mut(&mut self) -> &mut MeditationTimer {
        &mut self.meditation
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Queue the idle display.
    pub(crate) fn schedule_standby(&self) {
        self.dispatcher.schedule_all(standby());
    }
}

fn standby() -> [Effect; 3] {
    [
        Effect::status("待命"),
        Effect::emotion("neutral"),
        Effect::system_message(""),
    ]
}

fn alarm_notice(alarm_type: AlarmPhase, intensity: Option<RingIntensity>) -> Effect {
    Effect::Notify {
        message: Notification::Alarm {
            alarm_type,
            intensity,
        },
    }
}

fn wire_alarm_callbacks(alarms: &mut AlarmManager, dispatcher: &Dispatcher) {
    let d = dispatcher.clone();
    alarms.on_wake_up_alarm_triggered(move |intensity| {
        d.schedule_all([
            Effect::status("闹钟"),
            Effect::emotion("bell"),
            Effect::system_message("起床时间到了！"),
            alarm_notice(AlarmPhase::WakeUp, Some(intensity)),
        ]);
    });

    let d = dispatcher.clone();
    alarms.on_sleep_alarm_reminder(move || {
        d.schedule_all([
            Effect::status("睡眠提醒"),
            Effect::emotion("moon"),
            Effect::system_message("还有30分钟就该睡觉了"),
            Effect::Play {
                cue: AudioCue::Popup,
            },
        ]);
    });

    let d = dispatcher.clone();
    alarms.on_sleep_alarm_start(move || {
        d.schedule_all([
            Effect::status("助眠"),
            Effect::emotion("moon"),
            Effect::system_message("开始播放助眠音频"),
            alarm_notice(AlarmPhase::SleepStart, None),
        ]);
    });

    let d = dispatcher.clone();
    alarms.on_sleep_alarm_stop(move || {
        d.schedule_all(standby());
        d.schedule(alarm_notice(AlarmPhase::SleepStop, None));
    });

    let d = dispatcher.clone();
    alarms.on_alarm_dismissed(move |kind| match kind {
        AlarmKind::WakeUp => d.schedule_all([
            Effect::status("新闻播报"),
            Effect::emotion("newspaper"),
            Effect::system_message("开始播放新闻"),
            Effect::StartNewsBroadcast,
            Effect::Notify {
                message: Notification::News {
                    action: NewsAction::Start,
                },
            },
        ]),
        AlarmKind::Sleep => d.schedule_all(standby()),
    });
}
