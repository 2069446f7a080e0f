//! Fixed-point USD amounts.
//!
//! Stored as `i64` micro-dollars to keep budget arithmetic exact. The
//! platform API speaks decimal USD, so serde converts at the wire boundary
//! and nowhere else.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Micro-dollars per USD.
const MICROS_PER_USD: i64 = 1_000_000;

/// A USD amount with six decimal places of precision.
///
/// `Usd` is a fixed-point value (micro-dollars in an `i64`), so comparing,
/// subtracting, and dividing amounts is exact. In particular
/// `remaining / price` is a true floor division with no float
/// misclassification at unit boundaries.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Usd(i64);

impl Usd {
    /// Zero dollars.
    pub const ZERO: Self = Self(0);

    /// Create an amount from micro-dollars.
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create an amount from whole cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents * 10_000)
    }

    /// Create an amount from a float dollar value, rounding to the nearest
    /// micro-dollar.
    ///
    /// This is the only lossy entry point and exists for the wire boundary,
    /// where the platform API serializes prices as JSON numbers.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn from_f64(dollars: f64) -> Self {
        Self((dollars * MICROS_PER_USD as f64).round() as i64)
    }

    /// The amount in micro-dollars.
    #[must_use]
    pub const fn as_micros(&self) -> i64 {
        self.0
    }

    /// The amount as a float dollar value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_USD as f64
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtract, saturating at the `i64` bounds.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Add, saturating at the `i64` bounds.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Multiply a per-unit price by a unit count, saturating on overflow.
    #[must_use]
    pub fn saturating_mul_units(self, units: u64) -> Self {
        let units = i64::try_from(units).unwrap_or(i64::MAX);
        Self(self.0.saturating_mul(units))
    }

    /// How many units at `price` this amount can pay for (floor division).
    ///
    /// Returns `None` when `price` is not positive; a zero price affords
    /// unboundedly many units and the caller decides how to represent that.
    #[must_use]
    pub fn units_affordable(self, price: Self) -> Option<u64> {
        if price.0 <= 0 {
            return None;
        }
        Some(u64::try_from(self.0 / price.0).unwrap_or(0))
    }
}

impl Add for Usd {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Debug for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Usd({self})")
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / 1_000_000;
        let frac = abs % 1_000_000;
        if frac == 0 {
            write!(f, "{sign}${whole}")
        } else {
            let frac = format!("{frac:06}");
            write!(f, "{sign}${whole}.{}", frac.trim_end_matches('0'))
        }
    }
}

impl Serialize for Usd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Usd {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dollars = f64::deserialize(deserializer)?;
        Ok(Self::from_f64(dollars))
    }
}
