//! Channel descriptor table types

use std::collections::HashMap;

use super::ScalarType;

/// Channels in a capture, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct VariableSchema {
    /// Map of channel names to their descriptors (provides O(1) lookup)
    pub variables: HashMap<String, VariableDescriptor>,
    /// Size of one sample (the sample stride) in bytes
    pub sample_size: usize,
}

impl VariableSchema {
    pub fn new(variables: HashMap<String, VariableDescriptor>, sample_size: usize) -> Self {
        Self { variables, sample_size }
    }

    /// Get descriptor by name (O(1) lookup).
    pub fn get_variable(&self, name: &str) -> Option<&VariableDescriptor> {
        self.variables.get(name)
    }

    /// Check if a channel exists.
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Get the number of channels.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}

/// One slot of the descriptor table.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    /// Channel name as recorded by the simulator
    pub name: String,
    /// Raw type tag from the slot
    pub type_tag: i32,
    /// Decoded scalar type, `None` when the tag is unknown
    pub scalar_type: Option<ScalarType>,
    /// Byte offset within one sample
    pub offset: usize,
    /// Number of elements (1 for scalar, >1 for arrays)
    pub count: usize,
    /// Units of measurement (e.g., "s", "m/s")
    pub units: String,
    pub description: String,
}

impl VariableDescriptor {
    /// Whether the first element of this channel lies inside a sample of `sample_size` bytes.
    pub fn fits_in_sample(&self, sample_size: usize) -> bool {
        match self.scalar_type {
            Some(ty) => self.offset.checked_add(ty.size()).is_some_and(|end| end <= sample_size),
            None => false,
        }
    }
}
