//! Scalar extraction from one sample of the data region

use super::{ScalarType, Value, VariableDescriptor};

/// Decode the first element of `descriptor` from the sample starting at `sample_start`.
///
/// Reads are confined to `[sample_start, sample_start + sample_size)`. Returns
/// `None` when the type tag is unknown, when the channel does not fit inside
/// the sample, or when the sample itself runs past the end of `data`.
pub fn read_sample(
    data: &[u8],
    descriptor: &VariableDescriptor,
    sample_start: usize,
    sample_size: usize,
) -> Option<Value> {
    let scalar_type = descriptor.scalar_type?;
    if !descriptor.fits_in_sample(sample_size) {
        return None;
    }

    let sample_end = sample_start.checked_add(sample_size)?;
    let sample = data.get(sample_start..sample_end)?;
    let bytes = sample.get(descriptor.offset..descriptor.offset + scalar_type.size())?;

    let value = match scalar_type {
        ScalarType::Int8 => Value::Int8(bytes[0] as i8),
        ScalarType::Bool => Value::Bool(bytes[0] != 0),
        ScalarType::Int32 => Value::Int32(i32::from_le_bytes(bytes.try_into().ok()?)),
        ScalarType::BitField32 => Value::BitField32(u32::from_le_bytes(bytes.try_into().ok()?)),
        ScalarType::Float32 => Value::Float32(f32::from_le_bytes(bytes.try_into().ok()?)),
        ScalarType::Float64 => Value::Float64(f64::from_le_bytes(bytes.try_into().ok()?)),
    };

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn descriptor(tag: i32, offset: usize) -> VariableDescriptor {
        VariableDescriptor {
            name: "Channel".to_string(),
            type_tag: tag,
            scalar_type: ScalarType::from_tag(tag),
            offset,
            count: 1,
            units: String::new(),
            description: String::new(),
        }
    }

    fn sample_with(offset: usize, bytes: &[u8], size: usize) -> Vec<u8> {
        let mut sample = vec![0u8; size];
        sample[offset..offset + bytes.len()].copy_from_slice(bytes);
        sample
    }

    #[test]
    fn decodes_every_scalar_type() {
        let data = sample_with(0, &[0xFE], 16);
        assert_eq!(read_sample(&data, &descriptor(0, 0), 0, 16), Some(Value::Int8(-2)));

        let data = sample_with(3, &[1], 16);
        assert_eq!(read_sample(&data, &descriptor(1, 3), 0, 16), Some(Value::Bool(true)));

        let data = sample_with(4, &(-7i32).to_le_bytes(), 16);
        assert_eq!(read_sample(&data, &descriptor(2, 4), 0, 16), Some(Value::Int32(-7)));

        let data = sample_with(4, &0x8000_0001u32.to_le_bytes(), 16);
        assert_eq!(
            read_sample(&data, &descriptor(3, 4), 0, 16),
            Some(Value::BitField32(0x8000_0001))
        );

        let data = sample_with(8, &91.25f32.to_le_bytes(), 16);
        assert_eq!(read_sample(&data, &descriptor(4, 8), 0, 16), Some(Value::Float32(91.25)));

        let data = sample_with(8, &1234.5678f64.to_le_bytes(), 16);
        assert_eq!(read_sample(&data, &descriptor(5, 8), 0, 16), Some(Value::Float64(1234.5678)));
    }

    #[test]
    fn unknown_tag_yields_none() {
        let data = vec![0u8; 16];
        assert_eq!(read_sample(&data, &descriptor(9, 0), 0, 16), None);
    }

    #[test]
    fn channel_past_stride_is_not_read() {
        // The next sample's bytes would be readable, but they belong to another time step.
        let data = vec![0xAAu8; 32];
        assert_eq!(read_sample(&data, &descriptor(2, 14), 0, 16), None);
    }

    #[test]
    fn truncated_sample_yields_none() {
        let data = vec![0u8; 20];
        assert_eq!(read_sample(&data, &descriptor(2, 0), 16, 16), None);
    }

    #[test]
    fn reads_relative_to_sample_start() {
        let mut data = vec![0u8; 48];
        data[16 + 4..16 + 8].copy_from_slice(&5i32.to_le_bytes());
        data[32 + 4..32 + 8].copy_from_slice(&6i32.to_le_bytes());
        assert_eq!(read_sample(&data, &descriptor(2, 4), 16, 16), Some(Value::Int32(5)));
        assert_eq!(read_sample(&data, &descriptor(2, 4), 32, 16), Some(Value::Int32(6)));
    }

    proptest! {
        #[test]
        fn prop_never_panics_on_arbitrary_layouts(
            data in prop::collection::vec(any::<u8>(), 0..256),
            tag in -2i32..8,
            offset in 0usize..300,
            sample_start in 0usize..300,
            sample_size in 0usize..64,
        ) {
            let value = read_sample(&data, &descriptor(tag, offset), sample_start, sample_size);
            if value.is_some() {
                prop_assert!(sample_start + sample_size <= data.len());
                prop_assert!(offset < sample_size);
            }
        }
    }
}
