//! IBT file reading and parsing support
//!
//! This module decodes the simulator's session capture: the fixed header, the
//! channel descriptor table, and indexed access to the sample region.

pub mod format;
pub mod reader;

pub use format::{IbtDiskSubHeader, IbtHeader};
pub use reader::IbtReader;
