//! # AI Clock Core Library
//!
//! Scheduling core for a voice-assistant bedside clock: a wake-up and
//! bedtime alarm manager, a pomodoro cycle and a meditation countdown.
//! Everything runs on a single application task; the CLI (and any device
//! shell) drives the components with timer ticks and drains the effects
//! they produce.
//!
//! ## Architecture
//!
//! - **Alarms**: two alarm lines with minute-resolution triggers, snooze,
//!   a bedtime reminder and a fixed soothing-audio window
//! - **Timers**: 1 Hz countdowns for pomodoro and meditation sessions
//! - **Effects**: components enqueue UI/audio/notification work on a
//!   [`Dispatcher`]; [`Device::flush`] applies it to the [`Sinks`]
//! - **Storage**: integer key/value settings (TOML on disk) and TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`Device`]: Wires the components together and owns the effect queue
//! - [`AlarmManager`]: Alarm state machine and persistence
//! - [`PomodoroTimer`] / [`MeditationTimer`]: Countdown state machines
//! - [`Command`]: Remote command surface
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod clock;
pub mod commands;
pub mod device;
pub mod error;
pub mod events;
pub mod ports;
pub mod storage;
pub mod ticks;
pub mod timer;

pub use alarm::{AlarmKind, AlarmManager, AlarmState, AlarmTime, RingIntensity, WakeUpAlarm};
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{tool_catalog, Command, ParamSpec, ToolSpec};
pub use device::Device;
pub use error::{
    CommandError, ConfigError, CoreError, StoreError, TickError, ValidationError,
};
pub use events::{AlarmPhase, AudioCue, Dispatcher, Effect, NewsAction, Notification};
pub use ports::{AudioSink, NotificationSink, RecordingSinks, Sinks, UiSink};
pub use storage::{Config, FileStore, MemoryStore, SettingsStore};
pub use ticks::{ManualTicks, TickSource, TimerHandle};
pub use timer::{
    DailyFocusInfo, MeditationState, MeditationStatus, MeditationTimer, PomodoroState,
    PomodoroStatus, PomodoroTimer, TickCallback,
};
