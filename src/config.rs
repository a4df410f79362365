//! Pipeline configuration
//!
//! Every field has a default, so an empty document (or no file at all) gives
//! the standard run:
//!
//! ```yaml
//! outlier_threshold_fraction: 0.15
//! exclude_wet_sessions: true
//! max_file_size: 2147483648
//! header_probe_bytes: 500000
//! ```

use crate::filter::{DEFAULT_OUTLIER_THRESHOLD, FilterConfig};
use crate::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Files above this size are probed instead of loaded.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Bytes read from the start of an oversize file.
pub const DEFAULT_HEADER_PROBE_BYTES: usize = 500_000;

/// Options for one processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Laps slower than `best * (1 + fraction)` are outliers
    pub outlier_threshold_fraction: f64,
    /// Leave laps from sessions with precipitation out of statistics
    pub exclude_wet_sessions: bool,
    /// Size above which only the header region is read
    pub max_file_size: u64,
    /// Length of the header region read from an oversize file
    pub header_probe_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            outlier_threshold_fraction: DEFAULT_OUTLIER_THRESHOLD,
            exclude_wet_sessions: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            header_probe_bytes: DEFAULT_HEADER_PROBE_BYTES,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(text)
                .map_err(|e| TelemetryError::config(format!("Failed to parse config: {}", e)))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        let config = Self::from_yaml_str(&text)?;
        debug!(path = %path.display(), ?config, "Loaded pipeline config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.outlier_threshold_fraction;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(TelemetryError::config(format!(
                "outlier_threshold_fraction must be a finite non-negative number, got {}",
                threshold
            )));
        }

        if self.header_probe_bytes == 0 {
            return Err(TelemetryError::config("header_probe_bytes must be greater than zero"));
        }

        Ok(())
    }

    pub fn filter(&self) -> FilterConfig {
        FilterConfig {
            outlier_threshold_fraction: self.outlier_threshold_fraction,
            exclude_wet_sessions: self.exclude_wet_sessions,
        }
    }
}
