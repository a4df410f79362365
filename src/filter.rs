//! Outlier and wet-session filtering
//!
//! A lap is an outlier when it is slower than the group's best by more than
//! the configured fraction. Laps exactly on the threshold are kept.

use crate::schema::SessionMetadata;
use serde::{Deserialize, Serialize};

/// Default outlier threshold: 15% slower than the best lap.
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 0.15;

/// Options controlling which laps count toward statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub outlier_threshold_fraction: f64,
    pub exclude_wet_sessions: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            outlier_threshold_fraction: DEFAULT_OUTLIER_THRESHOLD,
            exclude_wet_sessions: true,
        }
    }
}

impl FilterConfig {
    /// Whether a session's laps are left out of lap statistics.
    ///
    /// Excluded sessions still count toward session totals.
    pub fn excludes_session(&self, metadata: &SessionMetadata) -> bool {
        self.exclude_wet_sessions && metadata.is_wet()
    }

    /// Slowest lap time that is still kept for a group whose best is `best`.
    pub fn outlier_cutoff(&self, best: f64) -> f64 {
        best + best * self.outlier_threshold_fraction
    }
}

/// Outcome of outlier filtering over one group of laps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredLaps {
    pub clean: Vec<f64>,
    pub outliers: usize,
}

/// Split `times` into clean laps and an outlier count.
///
/// The anchor is the minimum of `times` itself; an empty input yields an
/// empty result.
pub fn filter_outlier_laps(times: &[f64], config: &FilterConfig) -> FilteredLaps {
    let Some(best) = times.iter().copied().min_by(f64::total_cmp) else {
        return FilteredLaps::default();
    };

    let cutoff = config.outlier_cutoff(best);
    let clean: Vec<f64> = times.iter().copied().filter(|&t| t <= cutoff).collect();
    let outliers = times.len() - clean.len();

    FilteredLaps { clean, outliers }
}
