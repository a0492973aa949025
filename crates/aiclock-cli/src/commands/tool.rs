use aiclock_core::{tool_catalog, Command};
use clap::Subcommand;
use serde_json::Value;

use super::{execute_once, CliResult};

#[derive(Subcommand)]
pub enum ToolAction {
    /// List every tool with its parameters as JSON
    List,
    /// Invoke a tool once
    Call {
        /// Tool name (e.g. "self.pomodoro.get_status")
        name: String,
        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        arguments: String,
    },
}

pub fn run(action: ToolAction) -> CliResult {
    match action {
        ToolAction::List => {
            println!("{}", serde_json::to_string_pretty(&tool_catalog())?);
        }
        ToolAction::Call { name, arguments } => {
            let arguments: Value = serde_json::from_str(&arguments)?;
            execute_once(Command::from_tool_call(&name, arguments)?)?;
        }
    }
    Ok(())
}
