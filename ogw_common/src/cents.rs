use std::{fmt::Display, iter::Sum};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "BRL";

//--------------------------------------        Cents        ---------------------------------------------------------
/// An amount of money in the store currency, held as an integer number of cents.
///
/// Serialises as the raw integer. External APIs that speak in decimal major units (e.g. `50.00`) go through the
/// [`major_units`] serde helpers instead.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

/// Saturates rather than overflowing. Code that stores a total must use [`Cents::checked_add`] instead.
impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Cents::saturating_add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Cents {
    /// Formats as Brazilian reais, e.g. `R$ 1.234,50`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let (major, minor) = (abs / 100, abs % 100);
        let digits = major.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "{sign}R$ {grouped},{minor:02}")
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Converts a decimal amount in major units (reais) into cents, rounding half away from zero.
    pub fn try_from_major_units(value: f64) -> Result<Self, CentsConversionError> {
        if !value.is_finite() {
            return Err(CentsConversionError(format!("{value} is not a finite number")));
        }
        let cents = (value * 100.0).round();
        #[allow(clippy::cast_precision_loss)]
        let limit = i64::MAX as f64;
        if cents.abs() >= limit {
            return Err(CentsConversionError(format!("{value} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        let cents = cents as i64;
        Ok(Self(cents))
    }

    /// The amount in major units, for APIs that want decimals.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_major_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_mul(self, rhs: i64) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

/// Serde helpers for fields that carry money as decimal major units on the wire, e.g. `"unit_price": 50.0`.
///
/// ```rust,ignore
/// #[serde(with = "ogw_common::major_units")]
/// pub unit_price: Cents,
/// ```
pub mod major_units {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::Cents;

    pub fn serialize<S: Serializer>(value: &Cents, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_major_units())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cents, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Cents::try_from_major_units(value).map_err(D::Error::custom)
    }
}
