pub mod alarm;
pub mod config;
pub mod news;
pub mod run;
pub mod tool;

use std::sync::Arc;

use aiclock_core::{Command, Config, CoreError, Device, FileStore, ManualTicks, SystemClock};
use serde_json::Value;

use crate::sinks::JsonLines;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Device backed by the on-disk configuration and alarm settings.
pub fn open_device() -> Result<Device, CoreError> {
    let config = Config::load()?;
    let store = FileStore::open_default()?;
    Ok(Device::new(config, Arc::new(SystemClock), Box::new(store)))
}

/// Run a single command against a freshly loaded device, print the reply
/// and then any effects it queued as JSON lines.
///
/// Timers started this way end with the process; use `run` for a live
/// device.
pub fn execute_once(command: Command) -> CliResult {
    let mut device = open_device()?;
    let mut ticks = ManualTicks::new();
    let reply = device.execute(command, &mut ticks)?;
    print_reply(&reply)?;
    device.flush(&mut JsonLines::stdout());
    Ok(())
}

pub fn print_reply(reply: &Value) -> CliResult {
    match reply {
        Value::String(text) => println!("{text}"),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}
