//! Lap boundary detection
//!
//! Laps are recovered by watching the `Lap` counter channel sample by sample.
//! When the counter changes, the simulator has just published the time of the
//! lap that ended in `LapLastLapTime`, so that value is attributed to the
//! previous lap number.
//!
//! The scan is split in two steps:
//! - [`LapBoundaryScanner`] is a pure state machine fed one sample at a time
//! - [`apply_best_lap_fallback`] is a post-pass that consults the simulator's
//!   own `LapBestLapTime` at the final sample, which can reflect a lap whose
//!   boundary sample was never recorded

use crate::ibt::IbtReader;
use crate::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub const LAP_CHANNEL: &str = "Lap";
pub const LAST_LAP_TIME_CHANNEL: &str = "LapLastLapTime";
pub const BEST_LAP_TIME_CHANNEL: &str = "LapBestLapTime";

/// Laps at or above this many seconds are treated as logger artifacts.
pub const MAX_LAP_SECONDS: f64 = 600.0;

/// Whether a lap time lies in the open window `(0, 600)`.
pub fn is_valid_lap_time(seconds: f64) -> bool {
    seconds > 0.0 && seconds < MAX_LAP_SECONDS
}

/// One completed lap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapRecord {
    pub lap_number: u32,
    pub time_seconds: f64,
}

/// Laps found in one capture, in the order they completed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapScan {
    pub laps: Vec<LapRecord>,
    pub best_lap_time: Option<f64>,
}

/// State machine over the ordered `(Lap, LapLastLapTime)` readings of a capture.
#[derive(Debug, Default)]
pub struct LapBoundaryScanner {
    previous_lap: Option<i64>,
    scan: LapScan,
}

impl LapBoundaryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the readings of the next sample.
    pub fn observe(&mut self, current_lap: i64, last_lap_time: Option<f64>) {
        if let Some(previous) = self.previous_lap {
            if previous != current_lap && previous >= 0 {
                self.close_lap(previous, last_lap_time);
            }
        }
        self.previous_lap = Some(current_lap);
    }

    fn close_lap(&mut self, lap: i64, last_lap_time: Option<f64>) {
        let (Ok(lap_number), Some(time)) = (u32::try_from(lap), last_lap_time) else {
            trace!(lap, "Lap boundary without a readable lap time");
            return;
        };

        if !is_valid_lap_time(time) {
            trace!(lap, time, "Dropping lap time outside the valid window");
            return;
        }

        self.scan.laps.push(LapRecord { lap_number, time_seconds: time });
        if self.scan.best_lap_time.is_none_or(|best| time < best) {
            self.scan.best_lap_time = Some(time);
        }
    }

    pub fn finish(self) -> LapScan {
        self.scan
    }
}

/// Adopt the simulator's final best-lap reading when it beats the scanned best.
pub fn apply_best_lap_fallback(scan: &mut LapScan, final_best: Option<f64>) {
    let Some(final_best) = final_best else {
        return;
    };

    if final_best > 0.0 && scan.best_lap_time.is_none_or(|best| final_best < best) {
        debug!(
            scanned = ?scan.best_lap_time,
            final_best, "Adopting best lap from LapBestLapTime channel"
        );
        scan.best_lap_time = Some(final_best);
    }
}

/// Run the boundary scan over every sample of `reader`.
///
/// Fails with [`TelemetryError::MissingRequiredChannel`] when `Lap` or
/// `LapLastLapTime` is not in the descriptor table. A sample whose `Lap`
/// value cannot be decoded is skipped without affecting the scan state.
pub fn scan_laps(reader: &IbtReader) -> Result<LapScan> {
    let schema = reader.variables();
    let lap_var = schema
        .get_variable(LAP_CHANNEL)
        .ok_or_else(|| TelemetryError::missing_channel(LAP_CHANNEL))?;
    let last_lap_var = schema
        .get_variable(LAST_LAP_TIME_CHANNEL)
        .ok_or_else(|| TelemetryError::missing_channel(LAST_LAP_TIME_CHANNEL))?;

    let mut scanner = LapBoundaryScanner::new();
    for index in 0..reader.total_samples() {
        let Some(lap) = reader.read_value(lap_var, index) else {
            continue;
        };
        let last_lap_time = reader.read_value(last_lap_var, index).map(|v| v.as_f64());
        scanner.observe(lap.as_i64(), last_lap_time);
    }

    let scan = scanner.finish();
    debug!(
        laps = scan.laps.len(),
        best = ?scan.best_lap_time,
        samples = reader.total_samples(),
        "Lap scan complete"
    );
    Ok(scan)
}

/// `LapBestLapTime` at the last sample, if the channel exists and decodes.
pub fn read_final_best_lap(reader: &IbtReader) -> Option<f64> {
    let best_var = reader.variables().get_variable(BEST_LAP_TIME_CHANNEL)?;
    let last_index = reader.total_samples().checked_sub(1)?;
    reader.read_value(best_var, last_index).map(|v| v.as_f64())
}

/// Boundary scan followed by the best-lap fallback.
pub fn extract_laps(reader: &IbtReader) -> Result<LapScan> {
    let mut scan = scan_laps(reader)?;
    apply_best_lap_fallback(&mut scan, read_final_best_lap(reader));
    Ok(scan)
}
