mod countdown;
mod meditation;
mod pomodoro;

pub use meditation::{MeditationState, MeditationStatus, MeditationTimer};
pub use pomodoro::{DailyFocusInfo, PomodoroState, PomodoroStatus, PomodoroTimer};

/// Per-second callback receiving the remaining `(minutes, seconds)`.
pub type TickCallback = Box<dyn FnMut(u32, u32)>;
