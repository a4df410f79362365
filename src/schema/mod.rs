//! Session text schema
//!
//! The capture embeds a YAML-like session description. Only a few scalar
//! fields feed the statistics pipeline; [`SessionMetadata`] resolves them.

pub mod session;

pub use session::SessionMetadata;
