//! The income/outcome type shared by categories, transactions and debts.
//!
//! Older clients send the type as a boolean. The canonical mapping is
//! `false` for [EntryType::Income] and `true` for [EntryType::Outcome], and
//! this module is the only place where that conversion happens. In the
//! database the type is stored as `0` (income) or `1` (outcome).

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::Error;

/// Whether money flows in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money coming in. For debts: money owed to me (receivable).
    Income,
    /// Money going out. For debts: money I owe (payable).
    Outcome,
}

impl EntryType {
    /// The boolean form of the type, `true` for [EntryType::Outcome].
    pub fn as_bool(self) -> bool {
        matches!(self, EntryType::Outcome)
    }

    fn as_i64(self) -> i64 {
        match self {
            EntryType::Income => 0,
            EntryType::Outcome => 1,
        }
    }

    fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(EntryType::Income),
            1 => Some(EntryType::Outcome),
            _ => None,
        }
    }
}

impl From<bool> for EntryType {
    fn from(is_outcome: bool) -> Self {
        if is_outcome {
            EntryType::Outcome
        } else {
            EntryType::Income
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::Income => write!(f, "income"),
            EntryType::Outcome => write!(f, "outcome"),
        }
    }
}

impl FromStr for EntryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "false" | "0" => Ok(EntryType::Income),
            "outcome" | "true" | "1" => Ok(EntryType::Outcome),
            other => Err(Error::InvalidEntryType(other.to_owned())),
        }
    }
}

impl<'de> Deserialize<'de> for EntryType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(EntryTypeVisitor)
    }
}

struct EntryTypeVisitor;

impl de::Visitor<'_> for EntryTypeVisitor {
    type Value = EntryType;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("\"income\", \"outcome\", a boolean, 0 or 1")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(EntryType::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        EntryType::from_i64(value)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        i64::try_from(value)
            .ok()
            .and_then(EntryType::from_i64)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}

impl ToSql for EntryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_i64()))
    }
}

impl FromSql for EntryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        EntryType::from_i64(raw).ok_or(FromSqlError::OutOfRange(raw))
    }
}
