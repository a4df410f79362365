//! IBT file format structures and parsing
//!
//! Defines the binary structures of the simulator's session capture and the
//! parsing functions that decode them from an in-memory buffer.
//!
//! ## IBT File Structure
//!
//! 1. **Main Header** (112 bytes) - `irsdk_header` compatible structure
//! 2. **Disk Sub-Header** (32 bytes) - capture timing and record counts
//! 3. **Variable Headers** - 144-byte descriptor slots at `var_header_offset`
//! 4. **Session Info** - YAML-like text block at `session_info_offset`
//! 5. **Sample Data** - contiguous samples of `buf_len` bytes starting at `buf_offset`
//!
//! All integers are little-endian. Every read is bounds-checked against the
//! buffer and reports [`TelemetryError::MalformedContainer`] on overrun.

use crate::{Result, ScalarType, TelemetryError, VariableDescriptor, VariableSchema};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

// Size constants for IBT format structures
pub const IRSDK_HEADER_SIZE: usize = 112;
pub const IRSDK_DISK_SUBHEADER_SIZE: usize = 32;
pub const IRSDK_VAR_HEADER_SIZE: usize = 144;
const IRSDK_VAR_NAME_SIZE: usize = 32;
const IRSDK_VAR_DESC_SIZE: usize = 64;
const IRSDK_VAR_UNIT_SIZE: usize = 32;

/// Position of `varBuf[0].bufOffset`, the start of the sample region.
pub const SAMPLE_DATA_OFFSET_POS: usize = 52;

/// Shortest buffer that holds every header field this decoder reads.
pub const MIN_HEADER_SIZE: usize = SAMPLE_DATA_OFFSET_POS + 4;

/// The container version this decoder was written against.
pub const IBT_VERSION: i32 = 2;

/// IBT file header structure (matches the SDK's irsdk_header)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbtHeader {
    pub version: i32,
    pub status: i32,
    pub tick_rate: i32,
    pub session_info_update: i32,
    pub session_info_len: i32,
    pub session_info_offset: i32,
    pub num_vars: i32,
    pub var_header_offset: i32,
    pub num_buf: i32,
    /// Sample stride in bytes
    pub buf_len: i32,
    /// Start of the sample region as recorded in `varBuf[0]`
    pub buf_offset: i32,
}

/// IBT disk sub-header (capture-specific structure)
/// struct irsdk_diskSubHeader {
///   time_t sessionStartDate;   // 8 bytes (i64)
///   double sessionStartTime;   // 8 bytes (f64)
///   double sessionEndTime;     // 8 bytes (f64)
///   int sessionLapCount;       // 4 bytes (i32)
///   int sessionRecordCount;    // 4 bytes (i32)
/// }
#[derive(Debug, Clone, PartialEq)]
pub struct IbtDiskSubHeader {
    pub start_date: i64,   // time_t (unix timestamp)
    pub start_time: f64,   // session start time in seconds
    pub end_time: f64,     // session end time in seconds
    pub lap_count: i32,    // number of laps completed
    pub record_count: i32, // number of telemetry records
}

impl IbtHeader {
    pub fn parse_from_bytes(data: &[u8]) -> Result<Self> {
        trace!(len = data.len(), "Reading IBT header");
        if data.len() < MIN_HEADER_SIZE {
            return Err(TelemetryError::malformed(
                "IBT header reading",
                format!("File is {} bytes, header needs at least {}", data.len(), MIN_HEADER_SIZE),
            ));
        }

        // struct irsdk_header {
        //   int ver;                    // offset 0
        //   int status;                 // offset 4
        //   int tickRate;               // offset 8
        //   int sessionInfoUpdate;      // offset 12
        //   int sessionInfoLen;         // offset 16
        //   int sessionInfoOffset;      // offset 20
        //   int numVars;                // offset 24
        //   int varHeaderOffset;        // offset 28
        //   int numBuf;                 // offset 32
        //   int bufLen;                 // offset 36
        //   int pad1[2];                // offset 40
        //   irsdk_varBuf varBuf[4];     // offset 48: { tickCount, bufOffset, pad[2] }
        // }
        let header = Self {
            version: parse_i32_le(data, 0)?,
            status: parse_i32_le(data, 4)?,
            tick_rate: parse_i32_le(data, 8)?,
            session_info_update: parse_i32_le(data, 12)?,
            session_info_len: parse_i32_le(data, 16)?,
            session_info_offset: parse_i32_le(data, 20)?,
            num_vars: parse_i32_le(data, 24)?,
            var_header_offset: parse_i32_le(data, 28)?,
            num_buf: parse_i32_le(data, 32)?,
            buf_len: parse_i32_le(data, 36)?,
            buf_offset: parse_i32_le(data, SAMPLE_DATA_OFFSET_POS)?,
        };

        debug!(
            version = header.version,
            tick_rate = header.tick_rate,
            num_vars = header.num_vars,
            buf_len = header.buf_len,
            buf_offset = header.buf_offset,
            "Parsed IBT header"
        );

        Ok(header)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != IBT_VERSION {
            warn!(
                expected = IBT_VERSION,
                found = self.version,
                "Unexpected IBT version, decoding with the known layout"
            );
        }

        if self.num_vars < 0 {
            return Err(TelemetryError::malformed(
                "Header validation",
                "Number of variables cannot be negative",
            ));
        }

        if self.buf_len < 0 {
            return Err(TelemetryError::malformed(
                "Header validation",
                "Buffer length cannot be negative",
            ));
        }

        if self.num_vars > 0 && self.buf_len == 0 {
            return Err(TelemetryError::malformed(
                "Header validation",
                format!("{} variables declared with a zero sample stride", self.num_vars),
            ));
        }

        if self.session_info_offset < 0 || self.session_info_len < 0 {
            return Err(TelemetryError::malformed(
                "Header validation",
                "Session info offset and length cannot be negative",
            ));
        }

        if self.var_header_offset < 0 {
            return Err(TelemetryError::malformed(
                "Header validation",
                "Variable header offset cannot be negative",
            ));
        }

        if self.buf_len > 100_000_000 {
            return Err(TelemetryError::malformed(
                "Header validation",
                "Buffer length is unreasonably large",
            ));
        }

        if self.num_vars > 10_000 {
            return Err(TelemetryError::malformed(
                "Header validation",
                "Number of variables is unreasonably large",
            ));
        }

        Ok(())
    }

    /// Sample stride in bytes.
    pub fn sample_size(&self) -> usize {
        self.buf_len.max(0) as usize
    }

    /// End of the descriptor table, or an error if it overflows.
    pub fn var_table_end(&self) -> Result<usize> {
        let table_len = (self.num_vars.max(0) as usize)
            .checked_mul(IRSDK_VAR_HEADER_SIZE)
            .ok_or_else(|| TelemetryError::malformed("Variable table", "Table size overflowed"))?;
        (self.var_header_offset.max(0) as usize)
            .checked_add(table_len)
            .ok_or_else(|| TelemetryError::malformed("Variable table", "Table end overflowed"))
    }

    /// End of the session text block.
    pub fn session_info_end(&self) -> usize {
        self.session_info_offset.max(0) as usize + self.session_info_len.max(0) as usize
    }

    /// Resolve where samples begin.
    ///
    /// The value at offset 52 is adopted when it is consistent with the
    /// documented fields: at or after both the descriptor table and the
    /// session text, and within the file. Otherwise the start is derived from
    /// those fields. A session block running past the end of the file is not
    /// a lower bound.
    pub fn resolve_sample_data_offset(&self, file_len: usize) -> Result<usize> {
        let table_end = self.var_table_end()?;
        let session_end = self.session_info_end();
        let documented_start =
            if session_end <= file_len { table_end.max(session_end) } else { table_end };
        let recorded = self.buf_offset;

        if recorded >= 0 {
            let recorded = recorded as usize;
            if recorded >= documented_start && recorded <= file_len {
                return Ok(recorded);
            }
        }

        warn!(
            recorded,
            documented_start, file_len, "Sample data offset inconsistent with header, deriving it"
        );
        Ok(documented_start)
    }
}

impl IbtDiskSubHeader {
    /// Size of the disk sub-header structure in bytes
    pub const DISK_HEADER_SIZE: usize = IRSDK_DISK_SUBHEADER_SIZE;

    /// Parse the sub-header that follows the main header, if the buffer holds one.
    pub fn parse_from_bytes(data: &[u8]) -> Option<Self> {
        let bytes = data.get(IRSDK_HEADER_SIZE..IRSDK_HEADER_SIZE + IRSDK_DISK_SUBHEADER_SIZE)?;

        Some(Self {
            start_date: parse_i64_le(bytes, 0).ok()?,
            start_time: parse_f64_le(bytes, 8).ok()?,
            end_time: parse_f64_le(bytes, 16).ok()?,
            lap_count: parse_i32_le(bytes, 24).ok()?,
            record_count: parse_i32_le(bytes, 28).ok()?,
        })
    }
}

/// Decode the descriptor table addressed by the header.
///
/// When two slots share a name the later slot wins.
pub fn read_variable_table(data: &[u8], header: &IbtHeader) -> Result<VariableSchema> {
    debug!("Extracting variable schema for {} variables", header.num_vars);
    let sample_size = header.sample_size();
    if header.num_vars <= 0 {
        return Ok(VariableSchema::new(HashMap::new(), sample_size));
    }

    let table_end = header.var_table_end()?;
    if table_end > data.len() {
        return Err(TelemetryError::malformed(
            "Variable table",
            format!(
                "Table of {} slots at offset {} ends at {}, past file end {}",
                header.num_vars,
                header.var_header_offset,
                table_end,
                data.len()
            ),
        ));
    }

    let num_vars = header.num_vars as usize;
    let table_start = header.var_header_offset as usize;
    let mut variables = HashMap::with_capacity(num_vars);

    for i in 0..num_vars {
        let slot_start = table_start + i * IRSDK_VAR_HEADER_SIZE;
        let slot = &data[slot_start..slot_start + IRSDK_VAR_HEADER_SIZE];

        let type_tag = parse_i32_le(slot, 0)?;
        let offset = parse_i32_le(slot, 4)?;
        let count = parse_i32_le(slot, 8)?;

        let name = extract_null_terminated_string(&slot[16..16 + IRSDK_VAR_NAME_SIZE]);
        let description = extract_null_terminated_string(&slot[48..48 + IRSDK_VAR_DESC_SIZE]);
        let units = extract_null_terminated_string(&slot[112..112 + IRSDK_VAR_UNIT_SIZE]);

        if name.is_empty() || offset < 0 {
            debug!(slot = i, name = %name, offset, "Skipping unusable variable slot");
            continue;
        }

        let scalar_type = ScalarType::from_tag(type_tag);
        if scalar_type.is_none() {
            debug!("Variable '{}' has unknown type {}, values will not be decoded", name, type_tag);
        }

        let descriptor = VariableDescriptor {
            name: name.clone(),
            type_tag,
            scalar_type,
            offset: offset as usize,
            count: count.max(1) as usize,
            units,
            description,
        };

        if scalar_type.is_some() && !descriptor.fits_in_sample(sample_size) {
            warn!(
                name = %descriptor.name,
                offset = descriptor.offset,
                sample_size,
                "Variable lies outside the sample stride"
            );
        }

        if variables.insert(name, descriptor).is_some() {
            trace!(slot = i, "Duplicate variable name, later slot wins");
        }
    }

    debug!("Extracted {} variables with sample size {}", variables.len(), sample_size);
    Ok(VariableSchema::new(variables, sample_size))
}

/// Safe byte parsing helpers with bounds checking
pub(crate) fn parse_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    let bytes = data.get(offset..offset + 4).ok_or_else(|| {
        TelemetryError::malformed(
            "Integer parsing",
            format!("Insufficient data for i32 at offset {} (have {})", offset, data.len()),
        )
    })?;
    Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn parse_i64_le(data: &[u8], offset: usize) -> Result<i64> {
    let bytes = data.get(offset..offset + 8).ok_or_else(|| {
        TelemetryError::malformed(
            "Long integer parsing",
            format!("Insufficient data for i64 at offset {} (have {})", offset, data.len()),
        )
    })?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok(i64::from_le_bytes(raw))
}

fn parse_f64_le(data: &[u8], offset: usize) -> Result<f64> {
    let bytes = data.get(offset..offset + 8).ok_or_else(|| {
        TelemetryError::malformed(
            "Double precision float parsing",
            format!("Insufficient data for f64 at offset {} (have {})", offset, data.len()),
        )
    })?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok(f64::from_le_bytes(raw))
}

/// Extract null-terminated string from byte slice
fn extract_null_terminated_string(bytes: &[u8]) -> String {
    let null_pos = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..null_pos]).to_string()
}
