//! TOML-based device configuration.
//!
//! Stores timing parameters for:
//! - Pomodoro cycle (work, short break, long break, cycle length)
//! - Meditation (default and maximum duration)
//! - Alarm checks (poll interval, sleep reminder lead, soothing-audio window,
//!   default snooze)
//!
//! Configuration is stored at `<data_dir>/config.toml`. Every default equals
//! the firmware constant it replaces, so a missing file behaves exactly like
//! the stock device.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Longest single countdown any timer accepts.
const MAX_SEGMENT_MINUTES: u32 = 24 * 60;

/// Pomodoro cycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_loops_before_long_break")]
    pub loops_before_long_break: u32,
}

/// Meditation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeditationConfig {
    /// Used when a session is started with a duration of 0.
    #[serde(default = "default_meditation_minutes")]
    pub default_minutes: u32,
    /// Upper bound enforced by the command surface.
    #[serde(default = "default_meditation_max_minutes")]
    pub max_minutes: u32,
}

/// Alarm check configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_sleep_reminder_lead_minutes")]
    pub sleep_reminder_lead_minutes: u32,
    #[serde(default = "default_sleep_audio_secs")]
    pub sleep_audio_secs: i64,
    #[serde(default = "default_snooze_minutes")]
    pub default_snooze_minutes: u32,
}

/// Device configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub meditation: MeditationConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
}

// Default functions
fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_loops_before_long_break() -> u32 {
    4
}
fn default_meditation_minutes() -> u32 {
    10
}
fn default_meditation_max_minutes() -> u32 {
    120
}
fn default_check_interval_secs() -> u64 {
    60
}
fn default_sleep_reminder_lead_minutes() -> u32 {
    30
}
fn default_sleep_audio_secs() -> i64 {
    300
}
fn default_snooze_minutes() -> u32 {
    5
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            loops_before_long_break: default_loops_before_long_break(),
        }
    }
}

impl Default for MeditationConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_meditation_minutes(),
            max_minutes: default_meditation_max_minutes(),
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            sleep_reminder_lead_minutes: default_sleep_reminder_lead_minutes(),
            sleep_audio_secs: default_sleep_audio_secs(),
            default_snooze_minutes: default_snooze_minutes(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                // Every leaf is a non-negative integer except the signed audio window.
                let new_value = match existing {
                    serde_json::Value::Number(_) => value
                        .parse::<i64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|e| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?,
                    _ => return Err(unknown()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Reject values the timers cannot run with.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        let p = &self.pomodoro;
        if p.work_minutes == 0 || p.short_break_minutes == 0 || p.long_break_minutes == 0 {
            return invalid("pomodoro", "durations must be at least one minute");
        }
        if p.work_minutes > MAX_SEGMENT_MINUTES
            || p.short_break_minutes > MAX_SEGMENT_MINUTES
            || p.long_break_minutes > MAX_SEGMENT_MINUTES
        {
            return invalid("pomodoro", "durations must be at most 24 hours");
        }
        if p.loops_before_long_break == 0 {
            return invalid("pomodoro.loops_before_long_break", "must be at least 1");
        }
        if self.meditation.max_minutes > MAX_SEGMENT_MINUTES {
            return invalid("meditation.max_minutes", "must be at most 24 hours");
        }
        if self.meditation.default_minutes == 0
            || self.meditation.default_minutes > self.meditation.max_minutes
        {
            return invalid(
                "meditation.default_minutes",
                "must be between 1 and meditation.max_minutes",
            );
        }
        if self.alarm.check_interval_secs == 0 || self.alarm.check_interval_secs > 60 {
            return invalid(
                "alarm.check_interval_secs",
                "must be between 1 and 60 or alarm minutes can be skipped",
            );
        }
        if self.alarm.sleep_reminder_lead_minutes >= 24 * 60 {
            return invalid("alarm.sleep_reminder_lead_minutes", "must be under a day");
        }
        if self.alarm.default_snooze_minutes == 0 || self.alarm.default_snooze_minutes > 60 {
            return invalid("alarm.default_snooze_minutes", "must be between 1 and 60");
        }
        if self.alarm.sleep_audio_secs <= 0 {
            return invalid("alarm.sleep_audio_secs", "must be positive");
        }
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from the data directory, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or fails validation.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_err = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_err(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_err(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. The result is validated
    /// before it replaces `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
