//! Exact decimal money amounts.
//!
//! Amounts wrap [Decimal] so that sums like `100.00 - 30.00` are exact. They
//! are stored in SQLite as text to avoid the rounding that a `REAL` column
//! would introduce.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The most decimal places a ledger entry may have.
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// The largest amount a ledger entry may have, one trillion.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// An amount of money.
///
/// The sign is not meaningful for ledger entries, which carry an
/// [EntryType](crate::entry_type::EntryType) instead. Derived amounts such as
/// a net balance may be negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create an amount from a decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Create an amount for a new ledger entry.
    ///
    /// # Errors
    ///
    /// Returns a:
    /// - [Error::NonPositiveAmount] if `value` is zero or negative,
    /// - [Error::AmountTooPrecise] if `value` has more than [MAX_AMOUNT_SCALE]
    ///   significant decimal places,
    /// - or [Error::AmountTooLarge] if `value` is larger than [MAX_AMOUNT].
    pub fn positive(value: Decimal) -> Result<Self, Error> {
        if value <= Decimal::ZERO {
            return Err(Error::NonPositiveAmount(value));
        }

        if value.normalize().scale() > MAX_AMOUNT_SCALE {
            return Err(Error::AmountTooPrecise(value));
        }

        if value > MAX_AMOUNT {
            return Err(Error::AmountTooLarge(value));
        }

        Ok(Self(value))
    }

    /// Add `rhs` to this amount.
    ///
    /// # Errors
    ///
    /// Returns [Error::AmountOverflow] if the result cannot be represented.
    pub fn checked_add(self, rhs: Amount) -> Result<Amount, Error> {
        self.0
            .checked_add(rhs.0)
            .map(Amount)
            .ok_or(Error::AmountOverflow)
    }

    /// Subtract `rhs` from this amount.
    ///
    /// # Errors
    ///
    /// Returns [Error::AmountOverflow] if the result cannot be represented.
    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, Error> {
        self.0
            .checked_sub(rhs.0)
            .map(Amount)
            .ok_or(Error::AmountOverflow)
    }

    /// Add up `amounts`.
    ///
    /// # Errors
    ///
    /// Returns [Error::AmountOverflow] if the total cannot be represented.
    pub fn try_sum<I>(amounts: I) -> Result<Amount, Error>
    where
        I: IntoIterator<Item = Amount>,
    {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |total, amount| total.checked_add(amount))
    }

    /// The underlying decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Whether the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Amount)
            .map_err(|error| Error::InvalidAmount(format!("{s:?}: {error}")))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(text) => {
                let text = std::str::from_utf8(text)
                    .map_err(|error| FromSqlError::Other(Box::new(error)))?;
                Decimal::from_str(text)
                    .map(Amount)
                    .map_err(|error| FromSqlError::Other(Box::new(error)))
            }
            ValueRef::Integer(integer) => Ok(Amount(Decimal::from(integer))),
            ValueRef::Real(real) => Decimal::try_from(real)
                .map(Amount)
                .map_err(|error| FromSqlError::Other(Box::new(error))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

#[cfg(test)]
pub(crate) fn must_parse(text: &str) -> Amount {
    text.parse().expect("could not parse test amount")
}
