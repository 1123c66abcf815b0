//! Binary-coded decimal helpers.
//!
//! Every time field of the MCP7940 is stored as two BCD digits, tens in the
//! high nibble and ones in the low nibble. Control bits that share a byte with
//! a field must be masked off before calling [`bcd_to_int`].

use crate::datetime::ValidationError;

/// Decodes a packed BCD byte into its integer value.
///
/// Nibbles above 9 are not rejected; the result is plain
/// `high * 10 + low` arithmetic.
pub const fn bcd_to_int(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0x0F)
}

/// Encodes an integer in the range 0-99 as a packed BCD byte.
///
/// # Errors
/// Returns [`ValidationError::NotBcd`] for values above 99.
pub const fn int_to_bcd(value: u8) -> Result<u8, ValidationError> {
    if value > 99 {
        return Err(ValidationError::NotBcd(value));
    }
    Ok(((value / 10) << 4) | (value % 10))
}

/// Splits a value into its `(ones, tens)` BCD digits, reporting `error` when
/// the value is above `max_value`.
pub(crate) fn make_bcd(
    value: u8,
    max_value: u8,
    error: ValidationError,
) -> Result<(u8, u8), ValidationError> {
    if value > max_value {
        return Err(error);
    }
    let packed = int_to_bcd(value)?;
    Ok((packed & 0x0F, packed >> 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_conversions() {
        let pairs = [
            (0x00, 0),
            (0x02, 2),
            (0x09, 9),
            (0x10, 10),
            (0x11, 11),
            (0x44, 44),
            (0x99, 99),
        ];
        for (bcd, int) in pairs {
            assert_eq!(bcd_to_int(bcd), int);
            assert_eq!(int_to_bcd(int).unwrap(), bcd);
        }
    }

    #[test]
    fn test_int_roundtrip_full_range() {
        for n in 0..=99 {
            assert_eq!(bcd_to_int(int_to_bcd(n).unwrap()), n);
        }
    }

    #[test]
    fn test_bcd_roundtrip_valid_nibbles() {
        for high in 0..=9u8 {
            for low in 0..=9u8 {
                let b = (high << 4) | low;
                assert_eq!(int_to_bcd(bcd_to_int(b)).unwrap(), b);
            }
        }
    }

    #[test]
    fn test_int_to_bcd_out_of_range() {
        assert!(matches!(int_to_bcd(100), Err(ValidationError::NotBcd(100))));
        assert!(matches!(int_to_bcd(255), Err(ValidationError::NotBcd(255))));
    }

    #[test]
    fn test_bcd_to_int_passes_through_invalid_nibbles() {
        // 0x1A is not valid BCD, decoding is plain arithmetic
        assert_eq!(bcd_to_int(0x1A), 20);
    }

    #[test]
    fn test_make_bcd() {
        let err = ValidationError::InvalidMinute(0);
        assert_eq!(make_bcd(0, 59, err).unwrap(), (0, 0));
        assert_eq!(make_bcd(45, 59, err).unwrap(), (5, 4));
        assert_eq!(make_bcd(59, 59, err).unwrap(), (9, 5));
        assert!(matches!(
            make_bcd(60, 59, ValidationError::InvalidMinute(60)),
            Err(ValidationError::InvalidMinute(60))
        ));
        assert!(matches!(
            make_bcd(100, 255, err),
            Err(ValidationError::NotBcd(100))
        ));
    }
}
