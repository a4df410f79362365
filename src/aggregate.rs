//! Cross-session aggregation
//!
//! [`Aggregator`] is a fold over [`SessionResult`]s. It groups laps by
//! `(date, car)` and by car, and turns each group into summary statistics when
//! the fold is finished:
//!
//! ```rust
//! use pitboard::aggregate::Aggregator;
//! # use pitboard::session::SessionResult;
//! # fn sessions() -> Vec<SessionResult> { Vec::new() }
//!
//! let aggregates = sessions().iter().fold(Aggregator::default(), Aggregator::push).finish();
//! assert!(aggregates.daily.is_empty());
//! ```
//!
//! Sessions carrying an error note are skipped. Wet sessions count toward
//! session totals and track time, but their laps are left out when the filter
//! excludes them. The result does not depend on the order of pushes.

use crate::filter::{FilterConfig, filter_outlier_laps};
use crate::session::SessionResult;
use crate::stats::LapTimeStats;
use crate::timing::{format_duration, format_lap_time, format_range};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Lap statistics over one group's clean laps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapStatistics {
    pub total_laps_raw: usize,
    pub total_laps_clean: usize,
    pub outliers_filtered: usize,
    pub best_time: Option<f64>,
    pub best_time_formatted: Option<String>,
    pub median_time: Option<f64>,
    pub median_time_formatted: Option<String>,
    pub slowest_time: Option<f64>,
    pub slowest_time_formatted: Option<String>,
    pub range: Option<f64>,
    pub range_formatted: Option<String>,
    pub consistency_score: Option<u8>,
}

impl LapStatistics {
    /// Filter `raw_times` for outliers and summarize what remains.
    pub fn from_raw_times(raw_times: &[f64], filter: &FilterConfig) -> Self {
        let filtered = filter_outlier_laps(raw_times, filter);
        let stats = LapTimeStats::from_times(&filtered.clean);

        let best_time = stats.map(|s| s.best);
        let median_time = stats.map(|s| s.median);
        let slowest_time = stats.map(|s| s.slowest);
        let range = stats.map(|s| s.range());

        Self {
            total_laps_raw: raw_times.len(),
            total_laps_clean: filtered.clean.len(),
            outliers_filtered: filtered.outliers,
            best_time,
            best_time_formatted: best_time.and_then(format_lap_time),
            median_time,
            median_time_formatted: median_time.and_then(format_lap_time),
            slowest_time,
            slowest_time_formatted: slowest_time.and_then(format_lap_time),
            range,
            range_formatted: range.map(format_range),
            consistency_score: stats.map(|s| s.consistency),
        }
    }
}

/// Statistics for one car on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateCarAggregate {
    pub date: String,
    pub car: String,
    pub track: String,
    pub session_count: usize,
    pub wet_sessions: usize,
    pub session_time_seconds: f64,
    pub session_time_formatted: String,
    #[serde(flatten)]
    pub laps: LapStatistics,
}

/// Statistics for one car across every date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarAggregate {
    pub car: String,
    pub session_count: usize,
    pub wet_sessions: usize,
    pub session_time_seconds: f64,
    pub session_time_formatted: String,
    #[serde(flatten)]
    pub laps: LapStatistics,
}

/// Output of [`Aggregator::finish`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    /// Sorted by `(date, car)`
    pub daily: Vec<DateCarAggregate>,
    /// Sorted by descending session count, then car name
    pub cars: Vec<CarAggregate>,
}

impl Aggregates {
    /// Outliers removed across all `(date, car)` groups.
    pub fn outliers_filtered(&self) -> usize {
        self.daily.iter().map(|d| d.laps.outliers_filtered).sum()
    }
}

#[derive(Debug, Default)]
struct GroupAccumulator {
    // (time, file name, track) of the earliest session seen
    earliest: Option<(String, String, String)>,
    session_count: usize,
    wet_sessions: usize,
    durations: Vec<f64>,
    lap_times: Vec<f64>,
}

impl GroupAccumulator {
    fn add(&mut self, result: &SessionResult, include_laps: bool) {
        self.session_count += 1;
        if result.is_wet() {
            self.wet_sessions += 1;
        }
        self.durations.push(result.session_duration_seconds);

        let candidate = (result.time.clone(), result.file_name.clone(), result.metadata.track.clone());
        if self.earliest.as_ref().is_none_or(|current| candidate < *current) {
            self.earliest = Some(candidate);
        }

        if include_laps {
            self.lap_times.extend(result.laps.iter().map(|lap| lap.time_seconds));
        }
    }

    fn session_time_seconds(&self) -> f64 {
        let mut durations = self.durations.clone();
        durations.sort_by(f64::total_cmp);
        durations.iter().sum()
    }

    fn track(&self) -> String {
        self.earliest.as_ref().map(|(_, _, track)| track.clone()).unwrap_or_default()
    }
}

/// Fold state for per-date and per-car statistics
#[derive(Debug, Default)]
pub struct Aggregator {
    filter: FilterConfig,
    by_date_and_car: BTreeMap<(String, String), GroupAccumulator>,
    by_car: BTreeMap<String, GroupAccumulator>,
}

impl Aggregator {
    pub fn new(filter: FilterConfig) -> Self {
        Self { filter, ..Self::default() }
    }

    /// Add one session to the fold.
    pub fn push(mut self, result: &SessionResult) -> Self {
        self.add(result);
        self
    }

    /// Add one session in place.
    pub fn add(&mut self, result: &SessionResult) {
        if let Some(error) = &result.error {
            trace!(file = %result.file_name, error = %error, "Skipping session with error note");
            return;
        }

        let include_laps = !self.filter.excludes_session(&result.metadata);
        let car = result.metadata.car.clone();

        self.by_date_and_car
            .entry((result.date.clone(), car.clone()))
            .or_default()
            .add(result, include_laps);
        self.by_car.entry(car).or_default().add(result, include_laps);
    }

    pub fn finish(self) -> Aggregates {
        let filter = self.filter;

        let daily = self
            .by_date_and_car
            .into_iter()
            .map(|((date, car), group)| {
                let session_time_seconds = group.session_time_seconds();
                DateCarAggregate {
                    date,
                    car,
                    track: group.track(),
                    session_count: group.session_count,
                    wet_sessions: group.wet_sessions,
                    session_time_seconds,
                    session_time_formatted: format_duration(session_time_seconds),
                    laps: LapStatistics::from_raw_times(&group.lap_times, &filter),
                }
            })
            .collect();

        let mut cars: Vec<CarAggregate> = self
            .by_car
            .into_iter()
            .map(|(car, group)| {
                let session_time_seconds = group.session_time_seconds();
                CarAggregate {
                    car,
                    session_count: group.session_count,
                    wet_sessions: group.wet_sessions,
                    session_time_seconds,
                    session_time_formatted: format_duration(session_time_seconds),
                    laps: LapStatistics::from_raw_times(&group.lap_times, &filter),
                }
            })
            .collect();
        cars.sort_by(|a, b| b.session_count.cmp(&a.session_count).then_with(|| a.car.cmp(&b.car)));

        Aggregates { daily, cars }
    }
}
