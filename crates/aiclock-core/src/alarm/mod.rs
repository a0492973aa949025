//! Wake-up and sleep alarms.
//!
//! Two independent alarm lines share one state machine:
//!
//! ```text
//! Disabled -> Enabled -> Ringing -> (dismiss -> Disabled | snooze -> Snoozed -> Ringing)
//! ```
//!
//! Checks run once per minute against local wall-clock time and fire only on
//! an exact hour/minute match. A minute the device slept through is not fired
//! late.

mod manager;

pub use manager::{AlarmManager, WakeUpAlarm};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Which alarm line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    WakeUp,
    Sleep,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingIntensity {
    #[default]
    Gentle,
    Strong,
}

impl RingIntensity {
    /// Accepts the English and Chinese names used by voice commands.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "gentle" | "舒缓" => Some(RingIntensity::Gentle),
            "strong" | "强烈" => Some(RingIntensity::Strong),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RingIntensity::Gentle => "gentle",
            RingIntensity::Strong => "strong",
        }
    }

    pub(crate) fn to_stored(self) -> i64 {
        match self {
            RingIntensity::Gentle => 0,
            RingIntensity::Strong => 1,
        }
    }

    pub(crate) fn from_stored(v: i64) -> Self {
        if v == 1 {
            RingIntensity::Strong
        } else {
            RingIntensity::Gentle
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    #[default]
    Disabled,
    Enabled,
    Ringing,
    Snoozed,
}

impl AlarmState {
    pub(crate) fn to_stored(self) -> i64 {
        match self {
            AlarmState::Disabled => 0,
            AlarmState::Enabled => 1,
            AlarmState::Ringing => 2,
            AlarmState::Snoozed => 3,
        }
    }

    pub(crate) fn from_stored(v: i64) -> Self {
        match v {
            1 => AlarmState::Enabled,
            2 => AlarmState::Ringing,
            3 => AlarmState::Snoozed,
            _ => AlarmState::Disabled,
        }
    }
}

/// A validated time of day at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    /// # Errors
    /// Returns [`ValidationError::InvalidTime`] unless `hour` is in `0..24`
    /// and `minute` in `0..60`.
    pub fn new(hour: i32, minute: i32) -> Result<Self, ValidationError> {
        if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
            return Err(ValidationError::InvalidTime { hour, minute });
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    pub fn hour(self) -> u32 {
        u32::from(self.hour)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.minute)
    }

    pub fn matches(self, hour: u32, minute: u32) -> bool {
        self.hour() == hour && self.minute() == minute
    }

    /// The time `minutes` earlier, borrowing across the hour and midnight.
    pub fn minus_minutes(self, minutes: u32) -> Self {
        let total = self.hour() * 60 + self.minute();
        let shifted = (total + MINUTES_PER_DAY - minutes % MINUTES_PER_DAY) % MINUTES_PER_DAY;
        Self {
            hour: (shifted / 60) as u8,
            minute: (shifted % 60) as u8,
        }
    }
}

impl std::fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_time_bounds() {
        assert!(AlarmTime::new(0, 0).is_ok());
        assert!(AlarmTime::new(23, 59).is_ok());
        assert!(AlarmTime::new(24, 0).is_err());
        assert!(AlarmTime::new(7, 60).is_err());
        assert!(AlarmTime::new(-1, 0).is_err());
        assert!(AlarmTime::new(0, -1).is_err());
    }

    #[test]
    fn minus_minutes_borrows() {
        let t = AlarmTime::new(22, 30).unwrap();
        assert_eq!(t.minus_minutes(30).to_string(), "22:00");
        let t = AlarmTime::new(23, 10).unwrap();
        assert_eq!(t.minus_minutes(30).to_string(), "22:40");
        let t = AlarmTime::new(0, 10).unwrap();
        assert_eq!(t.minus_minutes(30).to_string(), "23:40");
        assert_eq!(t.minus_minutes(0), t);
    }

    #[test]
    fn intensity_names() {
        assert_eq!(RingIntensity::parse("strong"), Some(RingIntensity::Strong));
        assert_eq!(RingIntensity::parse("舒缓"), Some(RingIntensity::Gentle));
        assert_eq!(RingIntensity::parse("loud"), None);
        assert_eq!(RingIntensity::from_stored(RingIntensity::Strong.to_stored()), RingIntensity::Strong);
    }

    #[test]
    fn unknown_stored_state_is_disabled() {
        assert_eq!(AlarmState::from_stored(42), AlarmState::Disabled);
        assert_eq!(AlarmState::from_stored(AlarmState::Snoozed.to_stored()), AlarmState::Snoozed);
    }
}
