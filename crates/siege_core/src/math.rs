//! Fixed-point math utilities for deterministic scoring.
//!
//! Every score, resource amount and health total in the core is a
//! fixed-point number so that two runs over the same snapshot rank spawn
//! candidates identically on any CPU. Floats only appear at the parsing
//! boundary, where [`decimal_serde`] converts them once.

use fixed::types::I32F32;

/// Fixed-point number type for all decision math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Builds a fixed-point value from an integer count of hundredths.
///
/// Weight tables are written this way (`hundredths(60)` is `0.6`) so the
/// source never spells out a float literal.
#[must_use]
pub fn hundredths(n: i32) -> Fixed {
    Fixed::from_num(n) / Fixed::from_num(100)
}

/// Rounds to one decimal place, half away from zero.
///
/// Matches how the game engine reports resource pools.
#[must_use]
pub fn round_to_tenths(value: Fixed) -> Fixed {
    let ten = Fixed::from_num(10);
    (value * ten).round() / ten
}

/// Converts a decoded float into fixed-point, rejecting NaN and overflow.
#[must_use]
pub fn fixed_from_f64(value: f64) -> Option<Fixed> {
    Fixed::checked_from_num(value)
}

/// Serde support for fixed-point numbers written as plain decimals.
///
/// Config files and engine snapshots carry values like `0.6` or `13.9`;
/// this module reads them through `f64` and stores the fixed-point result.
pub mod decimal_serde {
    use super::{fixed_from_f64, Fixed};
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        fixed_from_f64(raw).ok_or_else(|| D::Error::custom(format!("{raw} is not representable")))
    }
}

/// Serde support for `Option<Fixed>` written as an optional decimal.
pub mod option_decimal_serde {
    use super::{fixed_from_f64, Fixed};
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize an optional fixed-point number.
    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => v.to_num::<f64>().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            Some(raw) => fixed_from_f64(raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("{raw} is not representable"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundredths() {
        assert_eq!(hundredths(50), Fixed::from_num(0.5));
        assert_eq!(hundredths(200), Fixed::from_num(2));
        assert_eq!(hundredths(-25), Fixed::from_num(-0.25));
    }

    #[test]
    fn test_round_to_tenths() {
        assert_eq!(
            round_to_tenths(Fixed::from_num(7.25)),
            Fixed::from_num(73) / Fixed::from_num(10)
        );
        assert_eq!(round_to_tenths(Fixed::from_num(12)), Fixed::from_num(12));
        let third = Fixed::from_num(10) / Fixed::from_num(3);
        assert_eq!(round_to_tenths(third), round_to_tenths(Fixed::from_num(3.3)));
    }

    #[test]
    fn test_fixed_from_f64_rejects_nan() {
        assert!(fixed_from_f64(f64::NAN).is_none());
        assert!(fixed_from_f64(1.0e12).is_none());
        assert_eq!(fixed_from_f64(14.0), Some(Fixed::from_num(14)));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = hundredths(60) * Fixed::from_num(30);
        let b = hundredths(60) * Fixed::from_num(30);
        assert_eq!(a, b);
    }
}
