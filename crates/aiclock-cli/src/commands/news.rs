use aiclock_core::Command;
use clap::Subcommand;

use super::{execute_once, CliResult};

#[derive(Subcommand)]
pub enum NewsAction {
    /// Start the news broadcast and notify the remote side
    Start,
    /// Stop the news broadcast
    Stop,
}

pub fn run(action: NewsAction) -> CliResult {
    match action {
        NewsAction::Start => execute_once(Command::StartNewsBroadcast),
        NewsAction::Stop => execute_once(Command::StopNewsBroadcast),
    }
}
