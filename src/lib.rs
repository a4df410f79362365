//! Lap statistics from iRacing session captures.
//!
//! Pitboard decodes `.ibt` telemetry files, recovers completed laps from the
//! lap counter channels, and folds them into per-day and per-car statistics
//! for the team's results site.
//!
//! # Features
//!
//! - **Layout-driven decoding**: header, channel descriptors and samples are
//!   located from the offsets the file declares
//! - **Lap recovery**: boundaries found from the `Lap` counter, with the
//!   simulator's own best-lap channel as a fallback
//! - **Clean statistics**: outlier laps and wet sessions are filtered before
//!   median, spread and consistency are computed
//! - **Fault isolation**: a corrupt file is reported and the run carries on
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pitboard::{PipelineConfig, SessionSource, report};
//!
//! fn main() -> pitboard::Result<()> {
//!     let config = PipelineConfig::default();
//!     let sources = vec![
//!         SessionSource::new("monza/f3 2025-01-01 20-15-00.ibt", "2025-01-01", "20:15:00"),
//!         SessionSource::new("monza/f3 2025-01-02 19-40-12.ibt", "2025-01-02", "19:40:12"),
//!     ];
//!
//!     let summary = pitboard::run(&sources, &config);
//!     report::log_summary(&summary);
//!     summary.write_json("telemetry.json")?;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;
mod yaml_utils;

// Data source modules
pub mod ibt;
pub mod schema;

// Lap extraction and statistics
pub mod aggregate;
pub mod config;
pub mod filter;
pub mod laps;
pub mod report;
pub mod session;
pub mod stats;
pub mod summary;
pub mod timing;

// Core exports
pub use error::*;
pub use types::*;

// Data source exports
pub use ibt::IbtReader;
pub use schema::SessionMetadata;

// Pipeline exports
pub use aggregate::{Aggregates, Aggregator, CarAggregate, DateCarAggregate};
pub use config::PipelineConfig;
pub use filter::FilterConfig;
pub use laps::{LapRecord, LapScan};
pub use session::{SessionResult, SessionSource, process_file};
pub use summary::{RunSummary, run};
