use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------       Money        -----------------------------------------------------------
/// A fixed-point currency amount, denominated in minor units (cents).
///
/// Orders snapshot catalog prices at creation time, so exactness matters: all arithmetic is integer arithmetic on
/// cents. On the wire the amount is a plain decimal number (`15.99`), matching what the catalog and downstream
/// consumers exchange.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Money(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in minor units (cents).
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Converts a decimal major-unit amount (e.g. `15.99`), rounding to the nearest cent.
    pub fn from_decimal(amount: f64) -> Result<Self, MoneyConversionError> {
        if !amount.is_finite() {
            return Err(MoneyConversionError(format!("{amount} is not a finite amount")));
        }
        let cents = (amount * 100.0).round();
        if cents.abs() >= i64::MAX as f64 {
            return Err(MoneyConversionError(format!("{amount} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        let cents = cents as i64;
        Ok(Self(cents))
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        let amount = trimmed.parse::<f64>().map_err(|e| MoneyConversionError(format!("{s}: {e}")))?;
        Self::from_decimal(amount)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Money::from_decimal(amount).map_err(de::Error::custom)
    }
}
