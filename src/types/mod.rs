//! Core types for channel descriptors and decoded sample values.
//!
//! The type system maps directly to the simulator SDK structures:
//! - [`ScalarType`] maps to `irsdk_VarType` with size information
//! - [`VariableDescriptor`] is one 144-byte slot of the descriptor table
//! - [`VariableSchema`] indexes descriptors by name with O(1) lookup
//! - [`read_sample`] decodes one channel from one sample, bounds-checked against the stride
//!
//! ## Usage Example
//!
//! ```rust
//! use pitboard::types::{ScalarType, Value, VariableDescriptor, read_sample};
//!
//! let lap = VariableDescriptor {
//!     name: "Lap".to_string(),
//!     type_tag: 2,
//!     scalar_type: ScalarType::from_tag(2),
//!     offset: 4,
//!     count: 1,
//!     units: String::new(),
//!     description: "Laps started count".to_string(),
//! };
//!
//! let mut sample = vec![0u8; 8];
//! sample[4..8].copy_from_slice(&3i32.to_le_bytes());
//! assert_eq!(read_sample(&sample, &lap, 0, 8), Some(Value::Int32(3)));
//! ```

mod sample;
mod schema;
mod variable_type;

pub use sample::read_sample;
pub use schema::{VariableDescriptor, VariableSchema};
pub use variable_type::{ScalarType, Value};
