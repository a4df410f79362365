//! Per-file processing
//!
//! [`process_file`] is the boundary at which a single capture either becomes a
//! [`SessionResult`] or an error. Nothing that goes wrong inside one file
//! escapes it, so a run over many files can record both outcomes and carry on.

use crate::config::PipelineConfig;
use crate::ibt::{IbtHeader, IbtReader, reader};
use crate::laps::{self, LapRecord};
use crate::schema::SessionMetadata;
use crate::{Result, TelemetryError, yaml_utils};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One capture to process, with the date and time it was recorded.
///
/// Date and time are supplied by the caller (typically parsed from the file
/// name) and are carried through unchanged as grouping keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSource {
    pub path: PathBuf,
    pub date: String,
    pub time: String,
}

impl SessionSource {
    pub fn new(path: impl Into<PathBuf>, date: impl Into<String>, time: impl Into<String>) -> Self {
        Self { path: path.into(), date: date.into(), time: time.into() }
    }

    /// Final path component, or the whole path when it has none.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Everything decoded from one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub file_name: String,
    pub date: String,
    pub time: String,
    pub metadata: SessionMetadata,
    pub laps: Vec<LapRecord>,
    pub best_lap_time: Option<f64>,
    pub session_duration_seconds: f64,
    /// Duration derived from the file size; no laps were read
    pub estimated: bool,
    /// Why laps are missing, when the capture lacks the lap channels
    pub error: Option<String>,
}

impl SessionResult {
    pub fn is_wet(&self) -> bool {
        self.metadata.is_wet()
    }

    pub fn lap_count(&self) -> usize {
        self.laps.len()
    }
}

/// Decode one capture from disk.
///
/// Files above `config.max_file_size` are not loaded: only the header region
/// is read and the duration is estimated from the file size.
pub fn process_file(source: &SessionSource, config: &PipelineConfig) -> Result<SessionResult> {
    let file_len = std::fs::metadata(&source.path)
        .map_err(|e| TelemetryError::file_error(source.path.clone(), e))?
        .len();

    if file_len > config.max_file_size {
        info!(
            file = %source.path.display(),
            file_len,
            max_file_size = config.max_file_size,
            "File exceeds size limit, estimating from header"
        );
        return probe_large_file(source, file_len, config.header_probe_bytes);
    }

    let reader = IbtReader::open(&source.path)?;
    process_reader(source, &reader)
}

/// Decode one capture already held in memory.
pub fn process_bytes(source: &SessionSource, data: Vec<u8>) -> Result<SessionResult> {
    let reader = IbtReader::from_bytes_with_path(data, source.path.clone())?;
    process_reader(source, &reader)
}

/// Build a session from an opened reader.
///
/// A missing lap channel yields a session with no laps and an error note.
pub fn process_reader(source: &SessionSource, reader: &IbtReader) -> Result<SessionResult> {
    let metadata = SessionMetadata::from_session_text(&reader.session_text()?);
    let mut result = SessionResult {
        file_name: source.file_name(),
        date: source.date.clone(),
        time: source.time.clone(),
        metadata,
        laps: Vec::new(),
        best_lap_time: None,
        session_duration_seconds: reader.duration_seconds(),
        estimated: false,
        error: None,
    };

    match laps::extract_laps(reader) {
        Ok(scan) => {
            result.laps = scan.laps;
            result.best_lap_time = scan.best_lap_time;
        }
        Err(e @ TelemetryError::MissingRequiredChannel { .. }) => {
            warn!(file = %result.file_name, error = %e, "Session has no lap data");
            result.error = Some(e.to_string());
        }
        Err(e) => return Err(e),
    }

    debug!(
        file = %result.file_name,
        track = %result.metadata.track,
        car = %result.metadata.car,
        laps = result.laps.len(),
        best = ?result.best_lap_time,
        duration = result.session_duration_seconds,
        "Processed session"
    );

    Ok(result)
}

fn probe_large_file(source: &SessionSource, file_len: u64, probe_bytes: usize) -> Result<SessionResult> {
    let probe = read_prefix(&source.path, probe_bytes)?;

    let header = IbtHeader::parse_from_bytes(&probe)?;
    header.validate()?;

    let text = yaml_utils::session_text_from_bytes(
        &probe,
        header.session_info_offset,
        header.session_info_len,
    )?;

    let file_len = usize::try_from(file_len).unwrap_or(usize::MAX);
    let data_offset = header.resolve_sample_data_offset(file_len)?;
    let samples = reader::count_samples(file_len, data_offset, header.sample_size());

    Ok(SessionResult {
        file_name: source.file_name(),
        date: source.date.clone(),
        time: source.time.clone(),
        metadata: SessionMetadata::from_session_text(&text),
        laps: Vec::new(),
        best_lap_time: None,
        session_duration_seconds: reader::duration_seconds(samples, header.tick_rate),
        estimated: true,
        error: None,
    })
}

fn read_prefix(path: &Path, len: usize) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
    let mut buffer = Vec::with_capacity(len);
    file.take(len as u64)
        .read_to_end(&mut buffer)
        .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
    Ok(buffer)
}
