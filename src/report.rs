//! Console report
//!
//! Renders a [`RunSummary`] as human-readable lines. The lines are emitted
//! through `tracing`, so the caller's subscriber decides where they go.

use crate::summary::RunSummary;
use crate::timing::format_range;
use tracing::info;

const UNAVAILABLE: &str = "N/A";

/// Human-readable report lines for `summary`.
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![
        "--- Summary ---".to_string(),
        format!("Total sessions: {}", summary.total_sessions),
        format!("Total laps recorded: {}", summary.total_laps),
        format!(
            "Best overall lap: {} ({})",
            summary.best_overall_time_formatted.as_deref().unwrap_or(UNAVAILABLE),
            summary.best_overall_file.as_deref().unwrap_or(UNAVAILABLE)
        ),
        "--- Filtering Stats ---".to_string(),
        format!("Wet sessions: {} (time counted, lap data excluded)", summary.wet_sessions),
        format!("Outlier laps filtered: {}", summary.outlier_laps_filtered),
        "--- Car Statistics ---".to_string(),
    ];

    for car in &summary.car_stats {
        let stats = &car.laps;
        lines.push(format!(
            "{}: {} best, median {}, {} consistency, {}/{} laps, {} track time",
            car.car,
            stats.best_time_formatted.as_deref().unwrap_or(UNAVAILABLE),
            stats.median_time_formatted.as_deref().unwrap_or(UNAVAILABLE),
            consistency(stats.consistency_score),
            stats.total_laps_clean,
            stats.total_laps_raw,
            car.session_time_formatted
        ));
    }

    lines.push("--- Daily Stats (by car) ---".to_string());
    for day in &summary.daily_bests {
        let stats = &day.laps;
        let outliers = match stats.outliers_filtered {
            0 => String::new(),
            n => format!(" [{} outliers]", n),
        };
        lines.push(format!(
            "{} [{}]: Best {}, {} on track, {} laps, {} consistency, range {}{}",
            day.date,
            day.car,
            stats.best_time_formatted.as_deref().unwrap_or(UNAVAILABLE),
            day.session_time_formatted,
            stats.total_laps_clean,
            consistency(stats.consistency_score),
            stats.range.map(format_range).as_deref().unwrap_or(UNAVAILABLE),
            outliers
        ));
    }

    lines.push(format!("--- Total Track Time: {} ---", summary.total_track_time_formatted));

    if !summary.errors.is_empty() {
        lines.push(format!("--- Failed Files: {} ---", summary.failed_files));
        for error in &summary.errors {
            lines.push(format!("{}: {}", error.file_name, error.error));
        }
    }

    lines
}

fn consistency(score: Option<u8>) -> String {
    score.map_or_else(|| UNAVAILABLE.to_string(), |s| format!("{}%", s))
}

/// Emit the report through `tracing` at info level.
pub fn log_summary(summary: &RunSummary) {
    for line in summary_lines(summary) {
        info!("{}", line);
    }
}
