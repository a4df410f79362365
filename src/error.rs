//! Error types for telemetry decoding and aggregation.
//!
//! Every error is scoped to a single input file except for configuration and
//! output serialization failures, which concern the whole run.
//!
//! ## Error Categories
//!
//! - **Container Errors**: header or descriptor table extends past the file bounds
//! - **Channel Errors**: a channel required for lap scanning is not in the descriptor table
//! - **File Errors**: the capture could not be opened or read
//! - **Config Errors**: a pipeline option is invalid or the config file cannot be parsed
//! - **Serialization Errors**: the run summary could not be rendered as JSON
//!
//! A lap time outside the `(0, 600)` second window is deliberately *not* an
//! error: the scanner drops it silently because logger glitches and partial
//! laps are routine in real captures.
//!
//! ## Per-file classification
//!
//! ```rust
//! use pitboard::TelemetryError;
//!
//! let error = TelemetryError::missing_channel("LapLastLapTime");
//! assert!(!error.is_file_fatal());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Malformed container ({context}): {details}")]
    MalformedContainer { context: String, details: String },

    #[error("Required channel '{channel}' not found in descriptor table")]
    MissingRequiredChannel { channel: String },

    #[error("IBT file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {details}")]
    Config { details: String },

    #[error("Failed to serialize run summary")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },
}

impl TelemetryError {
    /// Returns whether this error means the file produced no usable session.
    ///
    /// A missing lap channel still yields a session (with zero laps and an
    /// attached note), so it is the only per-file error that is not fatal.
    pub fn is_file_fatal(&self) -> bool {
        match self {
            TelemetryError::MalformedContainer { .. } => true,
            TelemetryError::MissingRequiredChannel { .. } => false,
            TelemetryError::File { .. } => true,
            TelemetryError::Config { .. } => true,
            TelemetryError::Serialization { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::MalformedContainer { .. } => vec![
                "Check the file was not truncated while copying",
                "Verify the capture was fully written before the simulator closed",
                "Re-export the session from the simulator",
            ],
            TelemetryError::MissingRequiredChannel { .. } => vec![
                "Enable lap timing channels in the simulator telemetry settings",
                "Check the capture comes from a driving session, not a replay",
            ],
            TelemetryError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the outlier threshold is a non-negative number",
                "Verify the configuration file is valid YAML",
            ],
            TelemetryError::Serialization { .. } => {
                vec!["Check for non-finite values in the aggregated statistics"]
            }
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }

    /// Helper constructor for container layout errors.
    pub fn malformed(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::MalformedContainer { context: context.into(), details: details.into() }
    }

    /// Helper constructor for missing lap channels.
    pub fn missing_channel(channel: impl Into<String>) -> Self {
        TelemetryError::MissingRequiredChannel { channel: channel.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        TelemetryError::Config { details: details.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::Serialization { source: err }
    }
}
