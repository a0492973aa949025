//! Remote command surface.
//!
//! Each tool the voice assistant may call is one [`Command`] variant. The
//! wire form is the tool-call envelope `{"name": "...", "arguments": {...}}`;
//! a flat object with the arguments next to `name` is accepted as well.
//! Replies are JSON values: a plain string for confirmations, an object for
//! status queries.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::alarm::{AlarmState, RingIntensity};
use crate::device::Device;
use crate::error::{CommandError, ValidationError};
use crate::events::{Effect, NewsAction, Notification};
use crate::ticks::TickSource;

const SNOOZE_MIN_MINUTES: i64 = 1;
const SNOOZE_MAX_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Command {
    /// Missing fields fall back to the stored wake-up time.
    #[serde(rename = "self.alarm.set_wake_up_time")]
    SetWakeUpTime {
        #[serde(default)]
        hour: Option<i32>,
        #[serde(default)]
        minute: Option<i32>,
    },
    #[serde(rename = "self.alarm.set_wake_up_ring_intensity")]
    SetWakeUpRingIntensity { intensity: String },
    #[serde(rename = "self.alarm.get_wake_up_alarm")]
    GetWakeUpAlarm,
    #[serde(rename = "self.alarm.enable_wake_up_alarm")]
    EnableWakeUpAlarm {
        #[serde(default = "default_enable")]
        enable: bool,
    },
    #[serde(rename = "self.alarm.snooze_wake_up_alarm")]
    SnoozeWakeUpAlarm {
        #[serde(default)]
        minutes: Option<i64>,
    },
    /// Missing fields fall back to the stored sleep time.
    #[serde(rename = "self.alarm.set_sleep_time")]
    SetSleepTime {
        #[serde(default)]
        hour: Option<i32>,
        #[serde(default)]
        minute: Option<i32>,
    },
    #[serde(rename = "self.alarm.get_sleep_alarm")]
    GetSleepAlarm,
    #[serde(rename = "self.alarm.enable_sleep_alarm")]
    EnableSleepAlarm {
        #[serde(default = "default_enable")]
        enable: bool,
    },
    #[serde(rename = "self.alarm.snooze_sleep_alarm")]
    SnoozeSleepAlarm {
        #[serde(default)]
        minutes: Option<i64>,
    },
    #[serde(rename = "self.alarm.dismiss")]
    DismissAlarm,
    #[serde(rename = "self.news.start_broadcast")]
    StartNewsBroadcast,
    #[serde(rename = "self.news.stop_broadcast")]
    StopNewsBroadcast,
    #[serde(rename = "self.pomodoro.start")]
    StartPomodoro,
    #[serde(rename = "self.pomodoro.stop")]
    StopPomodoro,
    #[serde(rename = "self.pomodoro.get_status")]
    PomodoroStatus,
    #[serde(rename = "self.pomodoro.get_daily_focus_time")]
    DailyFocusTime,
    /// 0 (or absent) starts a session of the configured default length.
    #[serde(rename = "self.meditation.start")]
    StartMeditation {
        #[serde(default)]
        duration_minutes: Option<i64>,
    },
    #[serde(rename = "self.meditation.stop")]
    StopMeditation,
    #[serde(rename = "self.meditation.get_status")]
    MeditationStatus,
}

fn default_enable() -> bool {
    true
}

impl Command {
    /// Parse one JSON command, either the `{"name", "arguments"}` envelope
    /// or a flat object.
    ///
    /// # Errors
    /// [`CommandError::Malformed`] for invalid JSON, an unknown tool name or
    /// arguments of the wrong type.
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| CommandError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Build a command from a tool name and its argument object.
    pub fn from_tool_call(name: &str, arguments: Value) -> Result<Self, CommandError> {
        let mut object = Map::new();
        object.insert("name".into(), Value::String(name.to_string()));
        object.insert("arguments".into(), arguments);
        Self::from_value(Value::Object(object))
    }

    fn from_value(value: Value) -> Result<Self, CommandError> {
        let Value::Object(mut object) = value else {
            return Err(CommandError::Malformed("expected a JSON object".into()));
        };

        match object.remove("arguments") {
            Some(Value::Object(arguments)) => {
                for (key, value) in arguments {
                    object.entry(key).or_insert(value);
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => {
                return Err(CommandError::Malformed(
                    "\"arguments\" must be an object".into(),
                ))
            }
        }

        serde_json::from_value(Value::Object(object))
            .map_err(|e| CommandError::Malformed(e.to_string()))
    }

    /// Tool name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetWakeUpTime { .. } => "self.alarm.set_wake_up_time",
            Command::SetWakeUpRingIntensity { .. } => "self.alarm.set_wake_up_ring_intensity",
            Command::GetWakeUpAlarm => "self.alarm.get_wake_up_alarm",
            Command::EnableWakeUpAlarm { .. } => "self.alarm.enable_wake_up_alarm",
            Command::SnoozeWakeUpAlarm { .. } => "self.alarm.snooze_wake_up_alarm",
            Command::SetSleepTime { .. } => "self.alarm.set_sleep_time",
            Command::GetSleepAlarm => "self.alarm.get_sleep_alarm",
            Command::EnableSleepAlarm { .. } => "self.alarm.enable_sleep_alarm",
            Command::SnoozeSleepAlarm { .. } => "self.alarm.snooze_sleep_alarm",
            Command::DismissAlarm => "self.alarm.dismiss",
            Command::StartNewsBroadcast => "self.news.start_broadcast",
            Command::StopNewsBroadcast => "self.news.stop_broadcast",
            Command::StartPomodoro => "self.pomodoro.start",
            Command::StopPomodoro => "self.pomodoro.stop",
            Command::PomodoroStatus => "self.pomodoro.get_status",
            Command::DailyFocusTime => "self.pomodoro.get_daily_focus_time",
            Command::StartMeditation { .. } => "self.meditation.start",
            Command::StopMeditation => "self.meditation.stop",
            Command::MeditationStatus => "self.meditation.get_status",
        }
    }
}

impl Device {
    /// Run one command against the device.
    ///
    /// Effects the command produces are queued; call [`Device::flush`]
    /// afterwards to apply them.
    ///
    /// # Errors
    /// Validation failures, unmet preconditions (e.g. enabling an alarm
    /// that has no time) and timer arming failures. State is unchanged in
    /// every error case.
    pub fn execute(
        &mut self,
        command: Command,
        ticks: &mut dyn TickSource,
    ) -> Result<Value, CommandError> {
        tracing::debug!(command = command.name(), "executing command");
        match command {
            Command::SetWakeUpTime { hour, minute } => {
                let previous = self.alarms.wake_up_alarm();
                let fallback = previous.map(|a| (a.hour as i32, a.minute as i32));
                let (hour, minute) = fill_time(hour, minute, fallback)
                    .ok_or_else(|| CommandError::Precondition("请提供起床时间".into()))?;
                let intensity = previous.map(|a| a.intensity).unwrap_or_default();
                self.alarms.set_wake_up_alarm(hour, minute, intensity)?;
                Ok(text(format!("起床时间已设置为 {hour:02}:{minute:02}")))
            }

            Command::SetWakeUpRingIntensity { intensity } => {
                let parsed = RingIntensity::parse(&intensity).ok_or_else(|| {
                    ValidationError::InvalidValue {
                        field: "intensity".into(),
                        message: "无效的强度值，请使用 'gentle' 或 'strong'".into(),
                    }
                })?;
                let current = self
                    .alarms
                    .wake_up_alarm()
                    .ok_or_else(|| CommandError::Precondition("请先设置起床时间".into()))?;
                self.alarms
                    .set_wake_up_alarm(current.hour as i32, current.minute as i32, parsed)?;
                Ok(text(format!("铃声强度已设置为: {intensity}")))
            }

            Command::GetWakeUpAlarm => Ok(match self.alarms.wake_up_alarm() {
                Some(alarm) => json!({
                    "hour": alarm.hour,
                    "minute": alarm.minute,
                    "intensity": alarm.intensity.as_str(),
                    "enabled": self.alarms.wake_up_state() == AlarmState::Enabled,
                }),
                None => text("未设置起床唤醒"),
            }),

            Command::EnableWakeUpAlarm { enable } => {
                if !self.alarms.enable_wake_up_alarm(enable) {
                    return Err(CommandError::Precondition("请先设置起床时间".into()));
                }
                Ok(text(if enable {
                    "起床唤醒已启用"
                } else {
                    "起床唤醒已禁用"
                }))
            }

            Command::SnoozeWakeUpAlarm { minutes } | Command::SnoozeSleepAlarm { minutes } => {
                let default = i64::from(self.config.alarm.default_snooze_minutes);
                let minutes = check_range(
                    "minutes",
                    minutes.unwrap_or(default),
                    SNOOZE_MIN_MINUTES,
                    SNOOZE_MAX_MINUTES,
                )?;
                if !self.alarms.snooze_alarm(minutes) {
                    return Err(CommandError::Precondition("当前没有正在响铃的闹钟".into()));
                }
                Ok(text(format!("已延迟 {minutes} 分钟后再次提醒")))
            }

            Command::SetSleepTime { hour, minute } => {
                let fallback = self
                    .alarms
                    .sleep_alarm()
                    .map(|t| (t.hour() as i32, t.minute() as i32));
                let (hour, minute) = fill_time(hour, minute, fallback)
                    .ok_or_else(|| CommandError::Precondition("请提供睡眠时间".into()))?;
                self.alarms.set_sleep_alarm(hour, minute)?;
                Ok(text(format!("睡眠时间已设置为 {hour:02}:{minute:02}")))
            }

            Command::GetSleepAlarm => Ok(match self.alarms.sleep_alarm() {
                Some(time) => json!({
                    "hour": time.hour(),
                    "minute": time.minute(),
                    "enabled": self.alarms.sleep_state() == AlarmState::Enabled,
                }),
                None => text("未设置睡眠提醒"),
            }),

            Command::EnableSleepAlarm { enable } => {
                if !self.alarms.enable_sleep_alarm(enable) {
                    return Err(CommandError::Precondition("请先设置睡眠时间".into()));
                }
                Ok(text(if enable {
                    "睡眠提醒已启用"
                } else {
                    "睡眠提醒已禁用"
                }))
            }

            Command::DismissAlarm => {
                if !self.alarms.dismiss_alarm() {
                    return Err(CommandError::Precondition("当前没有正在响铃的闹钟".into()));
                }
                Ok(text("闹钟已关闭"))
            }

            Command::StartNewsBroadcast => {
                self.alarms.start_news_broadcast();
                self.dispatcher.schedule(news_notice(NewsAction::Start));
                Ok(text("开始播放新闻"))
            }

            Command::StopNewsBroadcast => {
                self.alarms.stop_news_broadcast();
                self.dispatcher.schedule(news_notice(NewsAction::Stop));
                Ok(text("停止播放新闻"))
            }

            Command::StartPomodoro => {
                if !self.pomodoro.start(ticks, None)? {
                    return Ok(text("番茄钟已在运行中"));
                }
                Ok(text(format!(
                    "番茄钟已启动，开始{}分钟工作",
                    self.config.pomodoro.work_minutes
                )))
            }

            Command::StopPomodoro => {
                if !self.pomodoro.stop(ticks) {
                    return Ok(text("番茄钟未运行"));
                }
                self.schedule_standby();
                Ok(text("番茄钟已停止"))
            }

            Command::PomodoroStatus => to_reply(&self.pomodoro.status()),

            Command::DailyFocusTime => to_reply(&self.pomodoro.daily_focus_info()),

            Command::StartMeditation { duration_minutes } => {
                if self.meditation.is_running() {
                    return Ok(text("冥想定时器已在运行中"));
                }
                let max = i64::from(self.config.meditation.max_minutes);
                let minutes =
                    check_range("duration_minutes", duration_minutes.unwrap_or(0), 0, max)?;
                self.meditation.start(ticks, minutes, None)?;
                Ok(text(if minutes > 0 {
                    format!("冥想定时器已启动，时长 {minutes} 分钟")
                } else {
                    format!(
                        "冥想定时器已启动，默认时长 {} 分钟",
                        self.meditation.duration_minutes()
                    )
                }))
            }

            Command::StopMeditation => {
                if !self.meditation.stop(ticks) {
                    return Ok(text("冥想定时器未运行"));
                }
                self.schedule_standby();
                Ok(text("冥想定时器已停止"))
            }

            Command::MeditationStatus => to_reply(&self.meditation.status()),
        }
    }
}

fn text(message: impl Into<String>) -> Value {
    Value::String(message.into())
}

fn to_reply<T: Serialize>(value: &T) -> Result<Value, CommandError> {
    serde_json::to_value(value).map_err(|e| CommandError::Malformed(e.to_string()))
}

fn news_notice(action: NewsAction) -> Effect {
    Effect::Notify {
        message: Notification::News { action },
    }
}

/// Fill whichever half of a time is missing from `fallback`. `None` when
/// something is missing and there is nothing to fall back on.
fn fill_time(
    hour: Option<i32>,
    minute: Option<i32>,
    fallback: Option<(i32, i32)>,
) -> Option<(i32, i32)> {
    match (hour, minute) {
        (Some(h), Some(m)) => Some((h, m)),
        _ => {
            let (prev_h, prev_m) = fallback?;
            Some((hour.unwrap_or(prev_h), minute.unwrap_or(prev_m)))
        }
    }
}

fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<u32, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field: field.to_string(),
        value,
        min,
        max,
    })
}

// ── Catalog ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Integer,
    String,
    Boolean,
}

/// One tool parameter as advertised to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl ParamSpec {
    fn integer(name: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            kind: ParamKind::Integer,
            default: None,
            min: Some(min),
            max: Some(max),
        }
    }

    fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    fn plain(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            default: None,
            min: None,
            max: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParamSpec>,
}

/// Every tool [`Command`] understands, with its parameter bounds.
pub fn tool_catalog() -> Vec<ToolSpec> {
    let time_params = || {
        vec![
            ParamSpec::integer("hour", 0, 23),
            ParamSpec::integer("minute", 0, 59),
        ]
    };
    let snooze_params = || {
        vec![ParamSpec::integer("minutes", SNOOZE_MIN_MINUTES, SNOOZE_MAX_MINUTES)
            .with_default(json!(5))]
    };
    let tool = |name, description, parameters| ToolSpec {
        name,
        description,
        parameters,
    };

    vec![
        tool(
            "self.alarm.set_wake_up_time",
            "Set the wake-up time (24h). Omitted fields keep the previously set time.",
            time_params(),
        ),
        tool(
            "self.alarm.set_wake_up_ring_intensity",
            "Set the wake-up ring intensity: 'gentle' or 'strong'.",
            vec![ParamSpec::plain("intensity", ParamKind::String)],
        ),
        tool(
            "self.alarm.get_wake_up_alarm",
            "Get the wake-up time, intensity and whether it is enabled.",
            vec![],
        ),
        tool(
            "self.alarm.enable_wake_up_alarm",
            "Enable or disable the wake-up alarm.",
            vec![ParamSpec::plain("enable", ParamKind::Boolean).with_default(json!(true))],
        ),
        tool(
            "self.alarm.snooze_wake_up_alarm",
            "Ring again after the given number of minutes.",
            snooze_params(),
        ),
        tool(
            "self.alarm.set_sleep_time",
            "Set the bedtime (24h). Omitted fields keep the previously set time.",
            time_params(),
        ),
        tool(
            "self.alarm.get_sleep_alarm",
            "Get the bedtime and whether the reminder is enabled.",
            vec![],
        ),
        tool(
            "self.alarm.enable_sleep_alarm",
            "Enable or disable the bedtime reminder.",
            vec![ParamSpec::plain("enable", ParamKind::Boolean).with_default(json!(true))],
        ),
        tool(
            "self.alarm.snooze_sleep_alarm",
            "Remind again after the given number of minutes.",
            snooze_params(),
        ),
        tool("self.alarm.dismiss", "Dismiss a ringing alarm.", vec![]),
        tool(
            "self.news.start_broadcast",
            "Start the news broadcast.",
            vec![],
        ),
        tool("self.news.stop_broadcast", "Stop the news broadcast.", vec![]),
        tool(
            "self.pomodoro.start",
            "Start the pomodoro cycle: work, short break, long break every fourth loop.",
            vec![],
        ),
        tool("self.pomodoro.stop", "Stop the pomodoro cycle.", vec![]),
        tool(
            "self.pomodoro.get_status",
            "Get the pomodoro state, loop count and remaining seconds.",
            vec![],
        ),
        tool(
            "self.pomodoro.get_daily_focus_time",
            "Get today's accumulated focus time.",
            vec![],
        ),
        tool(
            "self.meditation.start",
            "Start a meditation session. 0 minutes uses the default length.",
            vec![ParamSpec::integer("duration_minutes", 0, 120).with_default(json!(0))],
        ),
        tool("self.meditation.stop", "Stop the meditation session.", vec![]),
        tool(
            "self.meditation.get_status",
            "Get the meditation state and remaining time.",
            vec![],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_envelope_and_flat_forms() {
        let envelope =
            Command::parse(r#"{"name":"self.alarm.set_wake_up_time","arguments":{"hour":7}}"#)
                .unwrap();
        let flat = Command::parse(r#"{"name":"self.alarm.set_wake_up_time","hour":7}"#).unwrap();
        assert_eq!(envelope, flat);
        assert_eq!(
            envelope,
            Command::SetWakeUpTime {
                hour: Some(7),
                minute: None
            }
        );
    }

    #[test]
    fn unit_tools_tolerate_empty_arguments() {
        let cmd = Command::parse(r#"{"name":"self.pomodoro.start","arguments":{}}"#).unwrap();
        assert_eq!(cmd, Command::StartPomodoro);
        let cmd = Command::parse(r#"{"name":"self.pomodoro.get_status"}"#).unwrap();
        assert_eq!(cmd, Command::PomodoroStatus);
    }

    #[test]
    fn enable_defaults_to_true() {
        let cmd = Command::from_tool_call("self.alarm.enable_sleep_alarm", json!({})).unwrap();
        assert_eq!(cmd, Command::EnableSleepAlarm { enable: true });
    }

    #[test]
    fn unknown_tool_is_malformed() {
        let err = Command::parse(r#"{"name":"self.lamp.on"}"#).unwrap_err();
        assert!(matches!(err, CommandError::Malformed(_)));
        let err = Command::parse("[1,2]").unwrap_err();
        assert!(matches!(err, CommandError::Malformed(_)));
    }

    #[test]
    fn names_round_trip_through_catalog() {
        let catalog = tool_catalog();
        for cmd in [
            Command::GetWakeUpAlarm,
            Command::DismissAlarm,
            Command::StartNewsBroadcast,
            Command::DailyFocusTime,
            Command::MeditationStatus,
        ] {
            assert!(catalog.iter().any(|t| t.name == cmd.name()), "{}", cmd.name());
        }
        assert_eq!(catalog.len(), 19);
    }

    #[test]
    fn fill_time_uses_fallback_per_field() {
        assert_eq!(fill_time(Some(6), None, Some((7, 30))), Some((6, 30)));
        assert_eq!(fill_time(None, None, Some((7, 30))), Some((7, 30)));
        assert_eq!(fill_time(None, Some(5), None), None);
        assert_eq!(fill_time(Some(25), Some(0), None), Some((25, 0)));
    }

    #[test]
    fn range_check() {
        assert_eq!(check_range("minutes", 60, 1, 60), Ok(60));
        assert!(matches!(
            check_range("minutes", 0, 1, 60),
            Err(ValidationError::OutOfRange { value: 0, .. })
        ));
    }
}
