//! Session text extraction and YAML cleanup
//!
//! The session block is YAML written by the simulator into a fixed-size
//! region. The region is NUL-padded and may carry stray control bytes, and
//! some free-text values are written unquoted even when they contain YAML
//! syntax. Cleanup happens in two steps:
//! - [`session_text_from_bytes`] strips NULs, replaces invalid UTF-8 and drops
//!   control characters other than `\n`, `\r` and `\t`
//! - [`preprocess_iracing_yaml`] quotes free-text values so a standard YAML
//!   parser accepts them

use crate::{Result, TelemetryError};
use tracing::warn;

/// Keys whose values are free text typed by users or generated from liveries.
///
/// `O'Connor, Mike` or a livery string starting with `,` break a YAML parser
/// unless quoted.
const FREE_TEXT_KEYS: &[&str] = &[
    "AbbrevName:",
    "TeamName:",
    "UserName:",
    "Initials:",
    "DriverSetupName:",
    "CarDesignStr:",
];

/// Extract and clean the session text block.
///
/// A non-positive length yields an empty string. A block that runs past the
/// end of `data` is clamped to the bytes that are present.
pub fn session_text_from_bytes(data: &[u8], offset: i32, length: i32) -> Result<String> {
    if offset < 0 {
        return Err(TelemetryError::malformed(
            "Session info extraction",
            format!("Invalid offset: {}", offset),
        ));
    }

    if length <= 0 {
        return Ok(String::new());
    }

    let offset = offset as usize;
    let length = length as usize;
    let end = offset.saturating_add(length);

    if end > data.len() {
        warn!(
            offset,
            length,
            buffer_size = data.len(),
            "Session info extends beyond buffer, clamping"
        );
    }

    let block = data.get(offset.min(data.len())..end.min(data.len())).unwrap_or_default();
    let without_nul: Vec<u8> = block.iter().copied().filter(|&b| b != 0).collect();
    Ok(strip_control_characters(&String::from_utf8_lossy(&without_nul)))
}

/// Remove control characters except newline, carriage return, tab.
pub fn strip_control_characters(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, '\x00'..='\x08' | '\x0B'..='\x0C' | '\x0E'..='\x1F'))
        .collect()
}

/// Quote the values of free-text keys so the text parses as YAML.
///
/// Values that already start with a quote are left alone. Single quotes
/// inside a value are doubled. Anything after the `...` document end marker
/// is dropped.
pub fn preprocess_iracing_yaml(yaml: &str) -> String {
    let mut result = String::with_capacity(yaml.len() + 64);

    for line in yaml.lines() {
        if line.trim_end() == "..." {
            result.push_str("...\n");
            break;
        }
        result.push_str(&quote_free_text_value(line));
        result.push('\n');
    }

    result
}

fn quote_free_text_value(line: &str) -> String {
    let body_start = line.len() - line.trim_start().len();
    let body = &line[body_start..];
    let key_start = match body.strip_prefix("- ") {
        Some(rest) => line.len() - rest.trim_start().len(),
        None => body_start,
    };

    let Some(key) = FREE_TEXT_KEYS.iter().find(|key| line[key_start..].starts_with(*key)) else {
        return line.to_string();
    };

    let after_key = key_start + key.len();
    let value = line[after_key..].trim();
    if value.is_empty() || value.starts_with('\'') || value.starts_with('"') {
        return line.to_string();
    }

    format!("{} '{}'", &line[..after_key], value.replace('\'', "''"))
}
