mod config;
pub mod migrations;
pub mod settings;

pub use config::{AlarmConfig, Config, MeditationConfig, PomodoroConfig};
pub use settings::{FileStore, MemoryStore, SettingsStore};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `AICLOCK_HOME` wins when set. Otherwise `~/.config/aiclock[-dev]/`,
/// where `AICLOCK_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("AICLOCK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("AICLOCK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("aiclock-dev")
            } else {
                base_dir.join("aiclock")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
