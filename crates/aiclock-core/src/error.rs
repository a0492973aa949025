//! Core error types for aiclock-core.
//!
//! Every public operation reports failure by return value; nothing in this
//! crate panics across the public boundary. Persistence and timer failures are
//! logged by the components themselves and only surface here for adapters.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for aiclock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Tick source errors
    #[error("Timer error: {0}")]
    Tick(#[from] TickError),

    /// Command surface errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Persisted key/value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing file could not be read
    #[error("Failed to read settings from {path}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    /// Backing file could not be written
    #[error("Failed to write settings to {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Alarm time outside 00:00..=23:59
    #[error("Invalid alarm time: {hour:02}:{minute:02}")]
    InvalidTime { hour: i32, minute: i32 },

    /// Numeric argument out of its documented range
    #[error("Value {value} for '{field}' is outside {min}..={max}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failure to arm the underlying periodic timer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickError {
    #[error("Timer '{0}' could not be started")]
    StartFailed(String),
}

/// Errors returned by the command surface.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The countdown could not be armed
    #[error(transparent)]
    Timer(#[from] TickError),

    /// Operation needs state that is not there (e.g. no alarm time set)
    #[error("{0}")]
    Precondition(String),

    /// Unknown command name or malformed arguments
    #[error("Malformed command: {0}")]
    Malformed(String),
}
