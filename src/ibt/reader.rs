//! IBT file reader
//!
//! Loads a capture into memory, decodes its header and descriptor table, and
//! gives indexed access to channel values in the sample region.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use pitboard::ibt::IbtReader;
//!
//! fn inspect() -> pitboard::Result<()> {
//!     let reader = IbtReader::open("session.ibt")?;
//!     println!("File contains {} samples", reader.total_samples());
//!
//!     if let Some(lap) = reader.variables().get_variable("Lap") {
//!         let last = reader.total_samples().saturating_sub(1);
//!         println!("Final lap counter: {:?}", reader.read_value(lap, last));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Performance Notes
//!
//! - File data is loaded into memory at construction time for fast random access
//! - Value reads are allocation-free and O(1)

use super::format::{IbtDiskSubHeader, IbtHeader, read_variable_table};
use crate::{Result, TelemetryError, Value, VariableDescriptor, VariableSchema, read_sample, yaml_utils};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// In-memory session capture with decoded header and descriptor table
pub struct IbtReader {
    data: Vec<u8>,
    path: PathBuf,
    header: IbtHeader,
    disk_header: Option<IbtDiskSubHeader>,
    variable_schema: VariableSchema,
    sample_data_offset: usize,
    total_samples: usize,
}

impl IbtReader {
    /// Open an IBT file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(&path)
            .map_err(|e| TelemetryError::file_error(path.as_ref().to_path_buf(), e))?;

        Self::from_bytes_with_path(data, path.as_ref().to_path_buf())
    }

    /// Create IbtReader from bytes (for testing)
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_path(data, PathBuf::from("<memory>"))
    }

    /// Create IbtReader from bytes with path context
    pub fn from_bytes_with_path(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        let header = IbtHeader::parse_from_bytes(&data)?;
        header.validate()?;

        let disk_header = IbtDiskSubHeader::parse_from_bytes(&data);
        let variable_schema = read_variable_table(&data, &header)?;

        let sample_data_offset = header.resolve_sample_data_offset(data.len())?;
        let total_samples = count_samples(data.len(), sample_data_offset, header.sample_size());

        if let Some(disk) = &disk_header {
            if disk.record_count > 0 && disk.record_count as usize != total_samples {
                warn!(
                    "Sample count mismatch: disk header reports {} records, calculated {} samples from file size",
                    disk.record_count, total_samples
                );
            }
        }

        debug!(
            path = %path.display(),
            total_samples,
            sample_data_offset,
            variables = variable_schema.variable_count(),
            "Opened IBT capture"
        );

        Ok(IbtReader {
            data,
            path,
            header,
            disk_header,
            variable_schema,
            sample_data_offset,
            total_samples,
        })
    }

    /// Session text with NUL padding and control characters removed.
    pub fn session_text(&self) -> Result<String> {
        yaml_utils::session_text_from_bytes(
            &self.data,
            self.header.session_info_offset,
            self.header.session_info_len,
        )
    }

    /// Get the variable schema for this IBT file
    pub fn variables(&self) -> &VariableSchema {
        &self.variable_schema
    }

    /// Number of complete samples in the data region
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    /// Absolute byte offset of the first sample
    pub fn sample_data_offset(&self) -> usize {
        self.sample_data_offset
    }

    /// Sample stride in bytes
    pub fn sample_size(&self) -> usize {
        self.variable_schema.sample_size
    }

    /// Absolute byte offset where sample `index` starts, if it exists.
    pub fn sample_start(&self, index: usize) -> Option<usize> {
        if index >= self.total_samples {
            return None;
        }
        index.checked_mul(self.sample_size())?.checked_add(self.sample_data_offset)
    }

    /// Decode one channel at sample `index`.
    pub fn read_value(&self, descriptor: &VariableDescriptor, index: usize) -> Option<Value> {
        let start = self.sample_start(index)?;
        read_sample(&self.data, descriptor, start, self.sample_size())
    }

    /// Recording rate in Hz as stored in the header.
    pub fn tick_rate(&self) -> i32 {
        self.header.tick_rate
    }

    /// Recorded duration, zero when the tick rate is not positive.
    pub fn duration_seconds(&self) -> f64 {
        duration_seconds(self.total_samples, self.header.tick_rate)
    }

    /// Get the file path this reader was opened from
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Get disk metadata from the disk sub-header
    pub fn disk_header(&self) -> Option<&IbtDiskSubHeader> {
        self.disk_header.as_ref()
    }

    /// Get the IBT header information
    pub fn header(&self) -> &IbtHeader {
        &self.header
    }

    /// Raw file bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// `floor((file_len - data_offset) / sample_size)`, zero for empty or degenerate layouts.
pub fn count_samples(file_len: usize, data_offset: usize, sample_size: usize) -> usize {
    if sample_size == 0 {
        return 0;
    }
    file_len.saturating_sub(data_offset) / sample_size
}

pub fn duration_seconds(samples: usize, tick_rate: i32) -> f64 {
    if tick_rate > 0 { samples as f64 / f64::from(tick_rate) } else { 0.0 }
}
