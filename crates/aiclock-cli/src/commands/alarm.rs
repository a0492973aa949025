use aiclock_core::Command;
use clap::{Subcommand, ValueEnum};
use serde_json::json;

use super::{execute_once, open_device, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum AlarmLine {
    Wake,
    Sleep,
}

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Set the wake-up time (24h). Enables the alarm.
    Wake {
        /// Hour, 0-23
        hour: i32,
        /// Minute, 0-59
        minute: i32,
        /// Ring intensity: gentle or strong
        #[arg(long)]
        intensity: Option<String>,
    },
    /// Set the bedtime (24h). Enables the reminder.
    Sleep {
        /// Hour, 0-23
        hour: i32,
        /// Minute, 0-59
        minute: i32,
    },
    /// Enable an alarm that has a time set
    Enable { line: AlarmLine },
    /// Disable an alarm, keeping its time
    Disable { line: AlarmLine },
    /// Print both alarms as JSON
    Show,
}

pub fn run(action: AlarmAction) -> CliResult {
    match action {
        AlarmAction::Wake {
            hour,
            minute,
            intensity,
        } => {
            execute_once(Command::SetWakeUpTime {
                hour: Some(hour),
                minute: Some(minute),
            })?;
            if let Some(intensity) = intensity {
                execute_once(Command::SetWakeUpRingIntensity { intensity })?;
            }
        }
        AlarmAction::Sleep { hour, minute } => execute_once(Command::SetSleepTime {
            hour: Some(hour),
            minute: Some(minute),
        })?,
        AlarmAction::Enable { line } => execute_once(toggle(line, true))?,
        AlarmAction::Disable { line } => execute_once(toggle(line, false))?,
        AlarmAction::Show => {
            let device = open_device()?;
            let alarms = device.alarms();
            let wake = alarms.wake_up_alarm();
            let report = json!({
                "wake_up": {
                    "time": wake.map(|a| format!("{:02}:{:02}", a.hour, a.minute)),
                    "intensity": wake.map(|a| a.intensity),
                    "state": alarms.wake_up_state(),
                    "snooze_until": alarms.wake_up_snooze_until(),
                },
                "sleep": {
                    "time": alarms.sleep_alarm().map(|t| t.to_string()),
                    "state": alarms.sleep_state(),
                    "snooze_until": alarms.sleep_snooze_until(),
                },
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn toggle(line: AlarmLine, enable: bool) -> Command {
    match line {
        AlarmLine::Wake => Command::EnableWakeUpAlarm { enable },
        AlarmLine::Sleep => Command::EnableSleepAlarm { enable },
    }
}
