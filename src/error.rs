//! Error types for Respite.
//!
//! Lifecycle mutators (`down`, `revive`, `start`, ...) deliberately return
//! `bool` rather than `Result`: a failed precondition is an expected race in
//! a live simulation, not an error. The types here cover the two places
//! where real failures exist — configuration loading and the durable
//! pending-action store — plus exit-code mapping for the ops CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the `respite` CLI.
///
/// Follows Unix conventions: sysexits-style usage error, 130/143 for
/// signal-driven termination.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Pending-action store error
    pub const STORE_ERROR: i32 = 4;

    /// Usage error (invalid arguments)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

/// Top-level error type for Respite operations.
#[derive(Debug, Error)]
pub enum RespiteError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Pending-action store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RespiteError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Store(_) => ExitCode::STORE_ERROR,
            Self::Io(_) | Self::Json(_) => ExitCode::IO_ERROR,
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message from the parser
        message: String,
    },

    /// Configuration file could not be read
    #[error("cannot read {path}: {source}")]
    ReadError {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with the invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

/// Durable pending-action store errors.
///
/// Confined to connect/disconnect boundaries; never surfaced from the
/// simulation tick path.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Marker read/write/delete failed
    #[error("marker I/O failed for entity {entity}: {source}")]
    Io {
        /// Entity id the marker belongs to
        entity: u64,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Backing directory could not be created
    #[error("cannot create marker directory {path}: {source}")]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Result type alias for Respite operations.
pub type Result<T> = std::result::Result<T, RespiteError>;
