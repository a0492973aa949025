//! Live device loop.
//!
//! Everything runs on one current-thread runtime: armed timers become tokio
//! intervals, stdin lines become commands, and queued effects are flushed to
//! stdout after every event. Alarm callbacks are not `Send`, so the device
//! never leaves this thread.
//!
//! Stdin accepts one JSON command per line (`{"name": ..., "arguments": ...}`)
//! or the word `button` to simulate the boot button.

use std::collections::BTreeMap;
use std::future::poll_fn;
use std::io::Write;
use std::task::Poll;
use std::time::Duration;

use aiclock_core::{Command, Device, TickError, TickSource, TimerHandle};
use clap::Args;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::{open_device, CliResult};
use crate::sinks::JsonLines;

#[derive(Args)]
pub struct RunArgs {
    /// Keep running after stdin closes, until Ctrl-C
    #[arg(long)]
    keep_alive: bool,
}

/// Tick source backed by tokio intervals, one per armed handle.
#[derive(Default)]
pub struct TokioTicks {
    timers: BTreeMap<TimerHandle, Interval>,
}

impl TickSource for TokioTicks {
    fn start_periodic(&mut self, handle: TimerHandle, period: Duration) -> Result<(), TickError> {
        if period.is_zero() {
            return Err(TickError::StartFailed(handle.name().to_string()));
        }
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timers.insert(handle, interval);
        tracing::debug!(timer = handle.name(), ?period, "timer armed");
        Ok(())
    }

    fn stop(&mut self, handle: TimerHandle) {
        if self.timers.remove(&handle).is_some() {
            tracing::debug!(timer = handle.name(), "timer stopped");
        }
    }
}

impl TokioTicks {
    /// Resolves with the next handle to fire. Stays pending while nothing
    /// is armed.
    pub async fn next_fire(&mut self) -> TimerHandle {
        poll_fn(|cx| {
            for (handle, interval) in self.timers.iter_mut() {
                if interval.poll_tick(cx).is_ready() {
                    return Poll::Ready(*handle);
                }
            }
            Poll::Pending
        })
        .await
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }
}

enum Event {
    Timer(TimerHandle),
    Line(String),
    InputClosed,
    Shutdown,
}

pub fn run(args: RunArgs) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_device(args))
}

async fn run_device(args: RunArgs) -> CliResult {
    let mut device = open_device()?;
    let mut ticks = TokioTicks::default();
    let mut out = JsonLines::stdout();
    device.start(&mut ticks)?;
    tracing::info!("device loop started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let event = tokio::select! {
            handle = ticks.next_fire() => Event::Timer(handle),
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => Event::Line(line),
                Ok(None) => Event::InputClosed,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stdin");
                    Event::InputClosed
                }
            },
            _ = &mut ctrl_c => Event::Shutdown,
        };

        match event {
            Event::Timer(handle) => device.on_timer(handle, &mut ticks),
            Event::Line(line) => handle_line(&mut device, &mut ticks, &mut out, line.trim()),
            Event::InputClosed => {
                stdin_open = false;
                if !args.keep_alive {
                    break;
                }
            }
            Event::Shutdown => break,
        }
        device.flush(&mut out);
    }

    device.shutdown(&mut ticks);
    device.flush(&mut out);
    tracing::info!("device loop stopped");
    Ok(())
}

fn handle_line<W: Write>(
    device: &mut Device,
    ticks: &mut dyn TickSource,
    out: &mut JsonLines<W>,
    line: &str,
) {
    match line {
        "" => {}
        "button" => {
            let dismissed = device.button_press();
            out.emit(&json!({ "button": { "dismissed": dismissed } }));
        }
        _ => match Command::parse(line) {
            Ok(command) => {
                let name = command.name();
                match device.execute(command, ticks) {
                    Ok(reply) => out.emit(&json!({ "name": name, "reply": reply })),
                    Err(e) => out.emit(&json!({ "name": name, "error": e.to_string() })),
                }
            }
            Err(e) => out.emit(&json!({ "error": e.to_string() })),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn armed_timer_fires_and_stop_disarms() {
        let mut ticks = TokioTicks::default();
        ticks
            .start_periodic(TimerHandle::Meditation, Duration::from_millis(10))
            .unwrap();
        assert!(ticks.is_armed(TimerHandle::Meditation));

        let fired = tokio::time::timeout(Duration::from_secs(2), ticks.next_fire())
            .await
            .unwrap();
        assert_eq!(fired, TimerHandle::Meditation);

        ticks.stop(TimerHandle::Meditation);
        assert!(!ticks.is_armed(TimerHandle::Meditation));
        let idle = tokio::time::timeout(Duration::from_millis(50), ticks.next_fire()).await;
        assert!(idle.is_err());
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut ticks = TokioTicks::default();
        let err = ticks
            .start_periodic(TimerHandle::Pomodoro, Duration::ZERO)
            .unwrap_err();
        assert_eq!(err, TickError::StartFailed("pomodoro_timer".into()));
    }
}
