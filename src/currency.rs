//! Integer rupiah amount type.
//!
//! The parking tariff is denominated in whole rupiah with no fractional
//! units, so amounts are plain integers rather than fixed-point decimals.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

/// A whole-rupiah currency amount.
///
/// Signed, because a change-due computation is allowed to go negative while
/// a tendered amount is still being corrected; settlement itself refuses to
/// proceed on a negative change.
///
/// # Examples
///
/// ```
/// use gate_settlement::Rupiah;
///
/// let fee = Rupiah::new(3000);
/// let tendered = Rupiah::new(5000);
/// assert_eq!((tendered - fee).to_string(), "2000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Rupiah(i64);

impl Rupiah {
    /// Zero value.
    pub const ZERO: Self = Rupiah(0);

    /// Creates an amount from a whole-rupiah value.
    pub fn new(value: i64) -> Self {
        Rupiah(value)
    }

    /// Returns the raw whole-rupiah value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Returns `true` if this amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if this amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl FromStr for Rupiah {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(Rupiah(trimmed.parse::<i64>()?))
    }
}

impl fmt::Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Rupiah {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Rupiah(self.0 + rhs.0)
    }
}

impl AddAssign for Rupiah {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Rupiah {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Rupiah(self.0 - rhs.0)
    }
}

impl SubAssign for Rupiah {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Rupiah(self.0 * rhs)
    }
}

// On the wire amounts are bare JSON numbers (`"amount_paid": 6000`).
impl Serialize for Rupiah {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Rupiah {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Ok(Rupiah(value))
    }
}
