//! Telemetry scalar type definitions

/// Scalar types a channel can be recorded as.
/// Maps to the simulator SDK's irsdk_VarType enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 8-bit signed integer (maps to irsdk_char)
    Int8,
    /// Boolean value (maps to irsdk_bool)
    Bool,
    /// 32-bit signed integer (maps to irsdk_int)
    Int32,
    /// 32-bit bitfield (maps to irsdk_bitField)
    BitField32,
    /// 32-bit floating point (maps to irsdk_float)
    Float32,
    /// 64-bit floating point (maps to irsdk_double)
    Float64,
}

impl ScalarType {
    /// Decode the type tag stored in a descriptor slot.
    ///
    /// Returns `None` for tags this decoder does not know, so channels added
    /// by newer simulator builds stay in the table without breaking decoding.
    pub const fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(ScalarType::Int8),
            1 => Some(ScalarType::Bool),
            2 => Some(ScalarType::Int32),
            3 => Some(ScalarType::BitField32),
            4 => Some(ScalarType::Float32),
            5 => Some(ScalarType::Float64),
            _ => None,
        }
    }

    /// Returns the size in bytes of this data type.
    pub const fn size(&self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::Bool => 1,
            ScalarType::Int32 | ScalarType::BitField32 | ScalarType::Float32 => 4,
            ScalarType::Float64 => 8,
        }
    }
}

/// A decoded channel value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int8(i8),
    Bool(bool),
    Int32(i32),
    BitField32(u32),
    Float32(f32),
    Float64(f64),
}

impl Value {
    /// Widen any value to `f64` for comparisons against lap-time windows.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Int8(v) => f64::from(v),
            Value::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int32(v) => f64::from(v),
            Value::BitField32(v) => f64::from(v),
            Value::Float32(v) => f64::from(v),
            Value::Float64(v) => v,
        }
    }

    /// Integer view of the value; floating values are truncated toward zero.
    pub fn as_i64(&self) -> i64 {
        match *self {
            Value::Int8(v) => i64::from(v),
            Value::Bool(v) => i64::from(v),
            Value::Int32(v) => i64::from(v),
            Value::BitField32(v) => i64::from(v),
            Value::Float32(v) => v as i64,
            Value::Float64(v) => v as i64,
        }
    }
}
