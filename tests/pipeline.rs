//! End-to-end runs over capture files written to a temporary directory.

#[allow(dead_code)]
#[path = "../src/test_utils.rs"]
mod test_utils;

use anyhow::{Context, Result, ensure};
use chrono::NaiveDateTime;
use pitboard::summary::GENERATED_FORMAT;
use pitboard::{PipelineConfig, RunSummary, SessionSource, TelemetryError, process_file, report};
use std::path::Path;
use tempfile::TempDir;
use test_utils::{capture_builder_with_laps, capture_with_laps, session_text};

fn write_capture(dir: &Path, name: &str, data: &[u8]) -> Result<SessionSource> {
    let path = dir.join(name);
    std::fs::write(&path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(SessionSource::new(path, "2025-05-10", "19:00:00"))
}

fn dated(mut source: SessionSource, date: &str, time: &str) -> SessionSource {
    source.date = date.to_string();
    source.time = time.to_string();
    source
}

#[test]
fn two_sessions_fold_into_one_daily_entry() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let dir = TempDir::new()?;
    let sources = vec![
        write_capture(dir.path(), "first.ibt", &capture_with_laps(&[91.0, 92.0]))?,
        write_capture(dir.path(), "second.ibt", &capture_with_laps(&[90.5]))?,
    ];

    let summary = pitboard::run(&sources, &PipelineConfig::default());

    assert_eq!(summary.total_sessions, 2);
    assert_eq!(summary.total_laps, 3);
    assert_eq!(summary.best_overall_time, Some(90.5));
    assert_eq!(summary.best_overall_file.as_deref(), Some("second.ibt"));

    ensure!(summary.daily_bests.len() == 1, "expected one daily entry");
    let day = &summary.daily_bests[0];
    assert_eq!(day.car, "Dallara F3");
    assert_eq!(day.track, "Autodromo Nazionale Monza");
    assert_eq!(day.session_count, 2);
    assert_eq!(day.laps.best_time, Some(90.5));
    assert_eq!(day.laps.total_laps_clean, 3);
    assert_eq!(day.laps.median_time, Some(91.0));
    Ok(())
}

#[test]
fn wet_session_counted_but_laps_excluded() -> Result<()> {
    let dir = TempDir::new()?;
    let wet = capture_builder_with_laps(&[85.0, 86.0])
        .session_text(&session_text("Autodromo Nazionale Monza", "Dallara F3", "Test Driver", 25))
        .build();
    let sources = vec![
        write_capture(dir.path(), "dry.ibt", &capture_with_laps(&[92.0, 93.0]))?,
        write_capture(dir.path(), "wet.ibt", &wet)?,
    ];

    let summary = pitboard::run(&sources, &PipelineConfig::default());

    assert_eq!(summary.total_sessions, 2);
    assert_eq!(summary.wet_sessions, 1);
    let day = &summary.daily_bests[0];
    assert_eq!(day.session_count, 2);
    assert_eq!(day.wet_sessions, 1);
    assert_eq!(day.laps.total_laps_raw, 2);
    assert_eq!(day.laps.best_time, Some(92.0));
    Ok(())
}

#[test]
fn wet_laps_included_when_configured() -> Result<()> {
    let dir = TempDir::new()?;
    let wet = capture_builder_with_laps(&[85.0])
        .session_text(&session_text("Spa", "Dallara F3", "Test Driver", 25))
        .build();
    let sources = vec![write_capture(dir.path(), "wet.ibt", &wet)?];

    let config = PipelineConfig::from_yaml_str("exclude_wet_sessions: false\n")?;
    let summary = pitboard::run(&sources, &config);
    assert_eq!(summary.daily_bests[0].laps.best_time, Some(85.0));
    Ok(())
}

#[test]
fn corrupt_file_does_not_stop_the_run() -> Result<()> {
    let dir = TempDir::new()?;
    let sources = vec![
        write_capture(dir.path(), "garbage.ibt", &[0xFF; 40])?,
        write_capture(dir.path(), "good.ibt", &capture_with_laps(&[95.5, 94.25]))?,
        SessionSource::new(dir.path().join("missing.ibt"), "2025-05-10", "20:00:00"),
    ];

    let summary = pitboard::run(&sources, &PipelineConfig::default());

    assert_eq!(summary.total_sessions, 3);
    assert_eq!(summary.failed_files, 2);
    assert_eq!(summary.sessions.len(), 1);
    assert_eq!(summary.best_overall_time, Some(94.25));

    let failed: Vec<&str> = summary.errors.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(failed, vec!["garbage.ibt", "missing.ibt"]);
    report::log_summary(&summary);
    Ok(())
}

#[test]
fn missing_lap_channel_yields_error_note() -> Result<()> {
    let dir = TempDir::new()?;
    let data = capture_builder_with_laps(&[90.0]).without_channel("Lap").build();
    let source = write_capture(dir.path(), "nolap.ibt", &data)?;

    let result = process_file(&source, &PipelineConfig::default())?;
    assert!(result.laps.is_empty());
    assert!(result.error.as_deref().is_some_and(|e| e.contains("'Lap'")));

    let summary = pitboard::run(&[source], &PipelineConfig::default());
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.daily_bests.is_empty());
    Ok(())
}

#[test]
fn truncated_header_is_malformed() -> Result<()> {
    let dir = TempDir::new()?;
    let source = write_capture(dir.path(), "short.ibt", &[0u8; 30])?;
    let result = process_file(&source, &PipelineConfig::default());
    assert!(matches!(result, Err(TelemetryError::MalformedContainer { .. })));
    Ok(())
}

#[test]
fn daily_and_car_ordering() -> Result<()> {
    fn gt3(laps: &[f32]) -> Vec<u8> {
        capture_builder_with_laps(laps)
            .session_text(&session_text("Monza", "Porsche 911 GT3 R", "Test Driver", 0))
            .build()
    }

    let dir = TempDir::new()?;

    let sources = vec![
        dated(write_capture(dir.path(), "a.ibt", &gt3(&[108.0]))?, "2025-05-11", "18:00:00"),
        dated(write_capture(dir.path(), "b.ibt", &gt3(&[107.5]))?, "2025-05-10", "18:00:00"),
        dated(write_capture(dir.path(), "c.ibt", &capture_with_laps(&[96.0]))?, "2025-05-10", "19:00:00"),
    ];

    let summary = pitboard::run(&sources, &PipelineConfig::default());

    let daily: Vec<(&str, &str)> =
        summary.daily_bests.iter().map(|d| (d.date.as_str(), d.car.as_str())).collect();
    assert_eq!(
        daily,
        vec![
            ("2025-05-10", "Dallara F3"),
            ("2025-05-10", "Porsche 911 GT3 R"),
            ("2025-05-11", "Porsche 911 GT3 R"),
        ]
    );

    let cars: Vec<&str> = summary.car_stats.iter().map(|c| c.car.as_str()).collect();
    assert_eq!(cars, vec!["Porsche 911 GT3 R", "Dallara F3"]);
    assert_eq!(summary.car_stats[0].session_count, 2);
    assert_eq!(summary.car_stats[0].laps.best_time, Some(107.5));
    Ok(())
}

#[test]
fn json_output_round_trips() -> Result<()> {
    let dir = TempDir::new()?;
    let sources = vec![write_capture(dir.path(), "s.ibt", &capture_with_laps(&[90.0, 91.5, 140.0]))?];
    let summary = pitboard::run(&sources, &PipelineConfig::default());

    let out = dir.path().join("telemetry.json");
    summary.write_json(&out)?;
    let text = std::fs::read_to_string(&out)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;

    let generated = json["generated"].as_str().context("generated stamp present")?;
    NaiveDateTime::parse_from_str(generated, GENERATED_FORMAT)
        .with_context(|| format!("unexpected stamp {}", generated))?;
    assert_eq!(json["totalSessions"], 1);
    assert_eq!(json["totalLaps"], 3);
    assert_eq!(json["bestOverallTimeFormatted"], "1:30.000");
    assert_eq!(json["outlierLapsFiltered"], 1);
    assert_eq!(json["dailyBests"][0]["totalLapsRaw"], 3);
    assert_eq!(json["dailyBests"][0]["totalLapsClean"], 2);
    assert_eq!(json["dailyBests"][0]["rangeFormatted"], "1.500s");
    assert_eq!(json["sessions"][0]["laps"][2]["timeFormatted"], "2:20.000");
    assert_eq!(json["sessions"][0]["track"], "Autodromo Nazionale Monza");

    let parsed: RunSummary = serde_json::from_str(&text)?;
    assert_eq!(parsed, summary);
    Ok(())
}
