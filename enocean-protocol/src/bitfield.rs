//! Big-endian bit addressing over telegram payloads.
//!
//! The payload is treated as a single bitstring; offset 0 is the most
//! significant bit of the first byte.

use crate::error::ProtocolError;

/// Widest field that can be read or written in one call.
pub const MAX_FIELD_BITS: usize = 64;

fn check_range(data: &[u8], offset: usize, size: usize) -> Result<(), ProtocolError> {
    let bits = data.len() * 8;
    if size < 1 || size > MAX_FIELD_BITS || offset + size > bits {
        return Err(ProtocolError::BitRange { offset, size, bits });
    }
    Ok(())
}

/// Read `size` bits starting at bit `offset` as an unsigned integer.
pub fn raw_bits(data: &[u8], offset: usize, size: usize) -> Result<u64, ProtocolError> {
    check_range(data, offset, size)?;
    let mut value = 0u64;
    for bit in offset..offset + size {
        let byte = data[bit / 8];
        let set = (byte >> (7 - bit % 8)) & 1;
        value = (value << 1) | u64::from(set);
    }
    Ok(value)
}

/// Write `value` into `size` bits starting at bit `offset`.
///
/// Bits outside the range are left untouched.
pub fn set_raw_bits(data: &mut [u8], offset: usize, size: usize, value: u64) -> Result<(), ProtocolError> {
    check_range(data, offset, size)?;
    if size < MAX_FIELD_BITS && value >> size != 0 {
        return Err(ProtocolError::ValueTooWide { value, size });
    }
    for i in 0..size {
        let bit = offset + i;
        let mask = 1u8 << (7 - bit % 8);
        if (value >> (size - 1 - i)) & 1 == 1 {
            data[bit / 8] |= mask;
        } else {
            data[bit / 8] &= !mask;
        }
    }
    Ok(())
}

/// Largest raw value representable in `size` bits.
pub fn max_raw(size: usize) -> u64 {
    if size >= MAX_FIELD_BITS {
        u64::MAX
    } else {
        (1u64 << size) - 1
    }
}

/// Read a field and map it linearly from `[0, 2^size - 1]` onto `[lo, hi]`.
pub fn scaled_value(data: &[u8], offset: usize, size: usize, lo: f64, hi: f64) -> Result<f64, ProtocolError> {
    if hi <= lo {
        return Err(ProtocolError::InvalidScale { min: lo, max: hi });
    }
    let raw = raw_bits(data, offset, size)?;
    Ok(lo + raw as f64 / max_raw(size) as f64 * (hi - lo))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: [u8; 4] = [0xA5, 0x0F, 0x80, 0x08];

    #[test]
    fn test_first_byte_and_last_bit() {
        assert_eq!(raw_bits(&DATA, 0, 8).unwrap(), 0xA5);
        assert_eq!(raw_bits(&DATA, 28, 1).unwrap(), 1);
        assert_eq!(raw_bits(&DATA, 31, 1).unwrap(), 0);
        assert_eq!(raw_bits(&DATA, 27, 1).unwrap(), 0);
    }

    #[test]
    fn test_offsets_count_from_most_significant_bit() {
        assert_eq!(raw_bits(&[0x01], 7, 1).unwrap(), 1);
        assert_eq!(raw_bits(&[0x01], 0, 1).unwrap(), 0);
        assert_eq!(raw_bits(&[0x80], 0, 1).unwrap(), 1);
        assert_eq!(raw_bits(&[0x00, 0x01], 15, 1).unwrap(), 1);
        assert_eq!(raw_bits(&[0x00, 0x01], 8, 1).unwrap(), 0);
    }

    #[test]
    fn test_fields_across_byte_boundaries() {
        assert_eq!(raw_bits(&DATA, 4, 8).unwrap(), 0x50);
        assert_eq!(raw_bits(&DATA, 12, 5).unwrap(), 0b11111);
        assert_eq!(raw_bits(&DATA, 0, 32).unwrap(), 0xA50F_8008);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(raw_bits(&DATA, 0, 0), Err(ProtocolError::BitRange { .. })));
        assert!(matches!(raw_bits(&DATA, 25, 8), Err(ProtocolError::BitRange { bits: 32, .. })));
        assert!(raw_bits(&[], 0, 1).is_err());
    }

    #[test]
    fn test_scaled_value() {
        let data = [125u8];
        let value = scaled_value(&data, 0, 8, 0.0, 40.8).unwrap();
        assert!((value - 20.0).abs() < 1e-9);
        assert_eq!(scaled_value(&[0xFF], 0, 8, -10.0, 10.0).unwrap(), 10.0);
        assert!(matches!(
            scaled_value(&data, 0, 8, 5.0, 5.0),
            Err(ProtocolError::InvalidScale { .. })
        ));
    }

    #[test]
    fn test_set_raw_bits_is_inverse() {
        let mut data = DATA;
        set_raw_bits(&mut data, 4, 8, 0x3C).unwrap();
        assert_eq!(raw_bits(&data, 4, 8).unwrap(), 0x3C);
        assert_eq!(data[0] & 0xF0, 0xA0);
        assert_eq!(data[1] & 0x0F, 0x0F);

        set_raw_bits(&mut data, 28, 1, 0).unwrap();
        assert_eq!(data[3], 0x00);
        set_raw_bits(&mut data, 31, 1, 1).unwrap();
        assert_eq!(data[3], 0x01);
    }

    #[test]
    fn test_set_raw_bits_rejects_wide_values() {
        let mut data = [0u8; 1];
        assert_eq!(
            set_raw_bits(&mut data, 0, 3, 8),
            Err(ProtocolError::ValueTooWide { value: 8, size: 3 })
        );
        assert_eq!(data, [0]);
    }
}
