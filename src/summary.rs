//! Run summary
//!
//! The JSON document handed to the presentation layer. It combines the
//! per-date and per-car aggregates with run-wide counters, the decoded
//! sessions, and the files that could not be used.

use crate::aggregate::{Aggregator, CarAggregate, DateCarAggregate};
use crate::config::PipelineConfig;
use crate::filter::FilterConfig;
use crate::schema::SessionMetadata;
use crate::session::{SessionResult, SessionSource, process_file};
use crate::timing::{format_duration, format_lap_time};
use crate::{Result, TelemetryError};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// A lap as it appears in the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapSummary {
    pub lap_number: u32,
    pub time_seconds: f64,
    pub time_formatted: Option<String>,
}

/// A decoded session as it appears in the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub file_name: String,
    pub date: String,
    pub time: String,
    #[serde(flatten)]
    pub metadata: SessionMetadata,
    pub is_wet: bool,
    pub laps: Vec<LapSummary>,
    pub total_laps: usize,
    pub best_lap_time: Option<f64>,
    pub best_lap_time_formatted: Option<String>,
    pub session_duration_seconds: f64,
    pub session_duration_formatted: String,
    pub estimated: bool,
}

impl From<&SessionResult> for SessionSummary {
    fn from(result: &SessionResult) -> Self {
        Self {
            file_name: result.file_name.clone(),
            date: result.date.clone(),
            time: result.time.clone(),
            metadata: result.metadata.clone(),
            is_wet: result.is_wet(),
            laps: result
                .laps
                .iter()
                .map(|lap| LapSummary {
                    lap_number: lap.lap_number,
                    time_seconds: lap.time_seconds,
                    time_formatted: format_lap_time(lap.time_seconds),
                })
                .collect(),
            total_laps: result.lap_count(),
            best_lap_time: result.best_lap_time,
            best_lap_time_formatted: result.best_lap_time.and_then(format_lap_time),
            session_duration_seconds: result.session_duration_seconds,
            session_duration_formatted: format_duration(result.session_duration_seconds),
            estimated: result.estimated,
        }
    }
}

/// A file that produced no usable session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileError {
    pub file_name: String,
    pub error: String,
}

/// Timestamp layout of [`RunSummary::generated`]: local time, microseconds, no offset.
pub const GENERATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Local time the summary was produced; empty until stamped
    #[serde(default)]
    pub generated: String,
    pub total_sessions: usize,
    pub total_laps: usize,
    pub best_overall_time: Option<f64>,
    pub best_overall_time_formatted: Option<String>,
    pub best_overall_file: Option<String>,
    pub total_track_time_seconds: f64,
    pub total_track_time_formatted: String,
    pub wet_sessions: usize,
    pub outlier_laps_filtered: usize,
    pub failed_files: usize,
    pub car_stats: Vec<CarAggregate>,
    pub daily_bests: Vec<DateCarAggregate>,
    pub sessions: Vec<SessionSummary>,
    pub errors: Vec<FileError>,
}

impl RunSummary {
    /// Build the summary from per-file outcomes, keyed by file name.
    ///
    /// Failed files and sessions with an error note are listed in `errors`
    /// and count toward `total_sessions` only. The result is not stamped;
    /// see [`with_generated`](Self::with_generated).
    pub fn from_outcomes<I>(outcomes: I, filter: &FilterConfig) -> Self
    where
        I: IntoIterator<Item = (String, Result<SessionResult>)>,
    {
        let mut total_sessions = 0;
        let mut sessions: Vec<SessionResult> = Vec::new();
        let mut errors = Vec::new();

        for (file_name, outcome) in outcomes {
            total_sessions += 1;
            match outcome {
                Ok(result) => {
                    if let Some(note) = result.error.clone() {
                        errors.push(FileError { file_name, error: note });
                    } else {
                        sessions.push(result);
                    }
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Failed to process file");
                    errors.push(FileError { file_name, error: e.to_string() });
                }
            }
        }

        let aggregates = sessions.iter().fold(Aggregator::new(*filter), Aggregator::push).finish();

        let best = sessions
            .iter()
            .filter_map(|s| s.best_lap_time.map(|t| (t, s.file_name.as_str())))
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        let best_overall_time = best.map(|(t, _)| t);

        let mut durations: Vec<f64> = sessions.iter().map(|s| s.session_duration_seconds).collect();
        durations.sort_by(f64::total_cmp);
        let total_track_time_seconds: f64 = durations.iter().sum();

        Self {
            generated: String::new(),
            total_sessions,
            total_laps: sessions.iter().map(SessionResult::lap_count).sum(),
            best_overall_time,
            best_overall_time_formatted: best_overall_time.and_then(format_lap_time),
            best_overall_file: best.map(|(_, file)| file.to_string()),
            total_track_time_seconds,
            total_track_time_formatted: format_duration(total_track_time_seconds),
            wet_sessions: sessions.iter().filter(|s| s.is_wet()).count(),
            outlier_laps_filtered: aggregates.outliers_filtered(),
            failed_files: errors.len(),
            car_stats: aggregates.cars,
            daily_bests: aggregates.daily,
            sessions: sessions.iter().map(SessionSummary::from).collect(),
            errors,
        }
    }

    /// Stamp the summary with the time it was produced.
    pub fn with_generated(mut self, at: DateTime<Local>) -> Self {
        self.generated = at.format(GENERATED_FORMAT).to_string();
        self
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the pretty-printed JSON document to `path`.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_pretty()?)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        info!(path = %path.display(), sessions = self.total_sessions, "Wrote run summary");
        Ok(())
    }
}

/// Process every source and summarize the run.
///
/// A file that fails to decode is recorded in the summary; it never stops
/// the run.
pub fn run<'a, I>(sources: I, config: &PipelineConfig) -> RunSummary
where
    I: IntoIterator<Item = &'a SessionSource>,
{
    let outcomes: Vec<(String, Result<SessionResult>)> = sources
        .into_iter()
        .map(|source| (source.file_name(), process_file(source, config)))
        .collect();

    info!(files = outcomes.len(), "Processed session files");
    RunSummary::from_outcomes(outcomes, &config.filter()).with_generated(Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laps::LapRecord;
    use anyhow::Result;
    use chrono::NaiveDate;

    fn session(file: &str, precipitation: u8, times: &[f64]) -> SessionResult {
        SessionResult {
            file_name: file.to_string(),
            date: "2025-03-01".to_string(),
            time: "18:00:00".to_string(),
            metadata: SessionMetadata {
                car: "Dallara F3".to_string(),
                precipitation_percent: precipitation,
                ..SessionMetadata::default()
            },
            laps: times
                .iter()
                .enumerate()
                .map(|(i, &t)| LapRecord { lap_number: i as u32, time_seconds: t })
                .collect(),
            best_lap_time: times.iter().copied().min_by(f64::total_cmp),
            session_duration_seconds: 1800.0,
            estimated: false,
            error: None,
        }
    }

    fn ok(result: SessionResult) -> (String, crate::Result<SessionResult>) {
        (result.file_name.clone(), Ok(result))
    }

    #[test]
    fn counters_cover_all_outcomes() {
        let outcomes = vec![
            ok(session("dry.ibt", 0, &[91.0, 92.0])),
            ok(session("wet.ibt", 50, &[89.0])),
            ("bad.ibt".to_string(), Err(TelemetryError::malformed("Header parsing", "too short"))),
        ];
        let summary = RunSummary::from_outcomes(outcomes, &FilterConfig::default());

        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.total_laps, 3);
        assert_eq!(summary.best_overall_time, Some(89.0));
        assert_eq!(summary.best_overall_file.as_deref(), Some("wet.ibt"));
        assert_eq!(summary.wet_sessions, 1);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.errors[0].file_name, "bad.ibt");
        assert_eq!(summary.sessions.len(), 2);
        assert_eq!(summary.total_track_time_seconds, 3600.0);
        assert_eq!(summary.total_track_time_formatted, "1:00:00");

        let day = &summary.daily_bests[0];
        assert_eq!(day.session_count, 2);
        assert_eq!(day.laps.best_time, Some(91.0));
    }

    #[test]
    fn error_notes_are_reported_not_aggregated() {
        let mut missing = session("nolaps.ibt", 0, &[]);
        missing.error = Some("Required channel 'Lap' not found in descriptor table".to_string());

        let summary = RunSummary::from_outcomes(vec![ok(missing)], &FilterConfig::default());
        assert_eq!(summary.total_sessions, 1);
        assert!(summary.sessions.is_empty());
        assert!(summary.daily_bests.is_empty());
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.total_track_time_seconds, 0.0);
    }

    #[test]
    fn empty_run() {
        let summary = RunSummary::from_outcomes(Vec::new(), &FilterConfig::default());
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.best_overall_time, None);
        assert_eq!(summary.best_overall_time_formatted, None);
        assert_eq!(summary.total_track_time_formatted, "0:00:00");
    }

    #[test]
    fn best_overall_ties_break_on_file_name() {
        let outcomes = vec![ok(session("b.ibt", 0, &[90.0])), ok(session("a.ibt", 0, &[90.0]))];
        let summary = RunSummary::from_outcomes(outcomes, &FilterConfig::default());
        assert_eq!(summary.best_overall_file.as_deref(), Some("a.ibt"));
    }

    #[test]
    fn json_shape() -> Result<()> {
        let summary =
            RunSummary::from_outcomes(vec![ok(session("s.ibt", 0, &[125.4321]))], &FilterConfig::default());
        let json: serde_json::Value = serde_json::from_str(&summary.to_json_pretty()?)?;

        assert_eq!(json["totalSessions"], 1);
        assert_eq!(json["bestOverallTimeFormatted"], "2:05.432");
        assert_eq!(json["carStats"][0]["car"], "Dallara F3");
        assert_eq!(json["dailyBests"][0]["date"], "2025-03-01");
        assert_eq!(json["sessions"][0]["isWet"], false);
        assert_eq!(json["sessions"][0]["laps"][0]["timeFormatted"], "2:05.432");
        assert_eq!(json["sessions"][0]["precipitation"], 0);
        assert!(json["errors"].as_array().is_some_and(Vec::is_empty));
        Ok(())
    }

    #[test]
    fn generated_stamp_uses_local_iso_layout() -> Result<()> {
        let at = NaiveDate::from_ymd_opt(2025, 5, 10)
            .and_then(|d| d.and_hms_micro_opt(19, 4, 5, 123_456))
            .and_then(|t| t.and_local_timezone(Local).earliest())
            .ok_or_else(|| anyhow::anyhow!("fixed timestamp is representable"))?;

        let summary = RunSummary::from_outcomes(Vec::new(), &FilterConfig::default());
        assert_eq!(summary.generated, "");

        let stamped = summary.with_generated(at);
        assert_eq!(stamped.generated, "2025-05-10T19:04:05.123456");
        let json: serde_json::Value = serde_json::from_str(&stamped.to_json_pretty()?)?;
        assert_eq!(json["generated"], "2025-05-10T19:04:05.123456");
        Ok(())
    }

    #[test]
    fn writes_json_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("telemetry.json");
        let summary = RunSummary::from_outcomes(Vec::new(), &FilterConfig::default());
        summary.write_json(&path)?;

        let parsed: RunSummary = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(parsed, summary);
        Ok(())
    }
}
