//! Gil currency amounts.

use serde::{Deserialize, Serialize};

/// An amount of gil, the in-game currency, in hundredths to avoid
/// floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gil {
    /// Amount in hundredths of a gil (e.g., 1000 = 10.00 gil).
    hundredths: i64,
}

impl Gil {
    /// Creates a new amount from hundredths of a gil.
    pub fn from_hundredths(hundredths: i64) -> Self {
        Self { hundredths }
    }

    /// Creates a new amount from whole gil.
    pub fn from_whole(gil: i64) -> Self {
        Self {
            hundredths: gil * 100,
        }
    }

    /// Returns zero gil.
    pub fn zero() -> Self {
        Self { hundredths: 0 }
    }

    /// Returns the amount in hundredths of a gil.
    pub fn hundredths(&self) -> i64 {
        self.hundredths
    }

    /// Multiplies the amount by a quantity, returning `None` on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Gil> {
        self.hundredths
            .checked_mul(i64::from(quantity))
            .map(Gil::from_hundredths)
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.hundredths == 0
    }
}

impl std::fmt::Display for Gil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, (self.hundredths % 100).abs())
    }
}

impl std::ops::Add for Gil {
    type Output = Gil;

    fn add(self, rhs: Gil) -> Gil {
        Gil::from_hundredths(self.hundredths + rhs.hundredths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_whole_converts_to_hundredths() {
        assert_eq!(Gil::from_whole(10).hundredths(), 1000);
        assert_eq!(Gil::from_whole(0), Gil::zero());
    }

    #[test]
    fn checked_mul_scales_by_quantity() {
        let unit = Gil::from_whole(10);
        assert_eq!(unit.checked_mul(2), Some(Gil::from_whole(20)));
        assert_eq!(unit.checked_mul(0), Some(Gil::zero()));
    }

    #[test]
    fn checked_mul_detects_overflow() {
        let huge = Gil::from_hundredths(i64::MAX);
        assert_eq!(huge.checked_mul(2), None);
    }

    #[test]
    fn display_formats_hundredths() {
        assert_eq!(Gil::from_hundredths(1050).to_string(), "10.50");
        assert_eq!(Gil::from_whole(7).to_string(), "7.00");
    }

    #[test]
    fn add_sums_amounts() {
        assert_eq!(
            Gil::from_whole(3) + Gil::from_hundredths(50),
            Gil::from_hundredths(350)
        );
    }

    #[test]
    fn serialization_roundtrip() {
        let amount = Gil::from_hundredths(2000);
        let json = serde_json::to_string(&amount).unwrap();
        let deserialized: Gil = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, deserialized);
    }
}
