use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod sinks;

#[derive(Parser)]
#[command(name = "aiclock-cli", version, about = "AI Clock CLI and device simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wake-up and sleep alarms
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// News broadcast control
    News {
        #[command(subcommand)]
        action: commands::news::NewsAction,
    },
    /// Assistant tool calls
    Tool {
        #[command(subcommand)]
        action: commands::tool::ToolAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the device loop: timers fire in real time, JSON commands are read
    /// from stdin and effects are written to stdout as JSON lines
    Run(commands::run::RunArgs),
}

fn main() {
    // Logs go to stderr; stdout carries command output and effect lines.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Alarm { action } => commands::alarm::run(action),
        Commands::News { action } => commands::news::run(action),
        Commands::Tool { action } => commands::tool::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
