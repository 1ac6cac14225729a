//! Debt models and the database functions that create, list and delete debts.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql, params_from_iter,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, de};
use time::Date;

use crate::{
    Error,
    amount::Amount,
    category::get_category_for_entry,
    config::PendingLimitPolicy,
    database_id::{CategoryId, DebtId, TransactionId},
    entry_type::EntryType,
    reconciliation::PendingAmount,
    transaction::get_transaction,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a debt has been settled.
///
/// Stored as `0` (unpaid) or `1` (paid). Clients may send `false`/`true` or
/// `0`/`1` in place of the text form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    /// Not settled yet. Every debt starts here.
    #[default]
    Unpaid,
    /// Settled. A debt moves here at most once.
    Paid,
}

impl DebtStatus {
    fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(DebtStatus::Unpaid),
            1 => Some(DebtStatus::Paid),
            _ => None,
        }
    }
}

impl Display for DebtStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DebtStatus::Unpaid => write!(f, "unpaid"),
            DebtStatus::Paid => write!(f, "paid"),
        }
    }
}

impl<'de> Deserialize<'de> for DebtStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DebtStatusVisitor)
    }
}

struct DebtStatusVisitor;

impl de::Visitor<'_> for DebtStatusVisitor {
    type Value = DebtStatus;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("\"unpaid\", \"paid\", a boolean, 0 or 1")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(if value {
            DebtStatus::Paid
        } else {
            DebtStatus::Unpaid
        })
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        DebtStatus::from_i64(value)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        i64::try_from(value)
            .ok()
            .and_then(DebtStatus::from_i64)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unpaid" | "false" | "0" => Ok(DebtStatus::Unpaid),
            "paid" | "true" | "1" => Ok(DebtStatus::Paid),
            _ => Err(E::invalid_value(de::Unexpected::Str(value), &self)),
        }
    }
}

impl ToSql for DebtStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let raw: i64 = match self {
            DebtStatus::Unpaid => 0,
            DebtStatus::Paid => 1,
        };

        Ok(ToSqlOutput::from(raw))
    }
}

impl FromSql for DebtStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        DebtStatus::from_i64(raw).ok_or(FromSqlError::OutOfRange(raw))
    }
}

/// Money that I owe ([EntryType::Outcome]) or that is owed to me ([EntryType::Income]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    /// The ID of the debt.
    pub id: DebtId,
    /// Payable ([EntryType::Outcome]) or receivable ([EntryType::Income]).
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// The amount owed, always positive.
    pub amount: Amount,
    /// The category used for the transaction recorded when an unlinked debt is settled.
    pub category_id: CategoryId,
    /// The transaction this debt offsets. Cleared if that transaction is deleted.
    pub transaction_id: Option<TransactionId>,
    /// Who owes or is owed the money.
    pub person: String,
    /// An optional note about the debt.
    pub description: Option<String>,
    /// When the debt was incurred.
    pub date: Date,
    /// Whether the debt has been settled.
    pub status: DebtStatus,
}

/// The fields of a debt before it is stored. New debts are always unpaid.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct NewDebt {
    pub entry_type: EntryType,
    pub amount: Amount,
    pub category_id: CategoryId,
    pub transaction_id: Option<TransactionId>,
    pub person: String,
    pub description: Option<String>,
    pub date: Date,
}

impl NewDebt {
    /// Create a new unlinked debt without a description.
    pub fn build(
        entry_type: EntryType,
        amount: Amount,
        category_id: CategoryId,
        person: &str,
        date: Date,
    ) -> Self {
        Self {
            entry_type,
            amount,
            category_id,
            transaction_id: None,
            person: person.to_owned(),
            description: None,
            date,
        }
    }

    /// Link the debt to the transaction `transaction_id`.
    pub fn transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Set the description for the debt.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
}

/// Request body for debt creation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DebtForm {
    #[serde(default, rename = "type")]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
    #[serde(default)]
    pub person: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<Date>,
}

impl TryFrom<DebtForm> for NewDebt {
    type Error = Error;

    fn try_from(form: DebtForm) -> Result<Self, Self::Error> {
        let entry_type = form.entry_type.ok_or(Error::MissingField("type"))?;
        let amount = form.amount.ok_or(Error::MissingField("amount"))?;
        let amount = Amount::positive(amount.value())?;
        let category_id = form.category_id.ok_or(Error::MissingField("category_id"))?;
        let person = form.person.ok_or(Error::MissingField("person"))?;
        let date = form.date.ok_or(Error::MissingField("date"))?;

        let mut new_debt = NewDebt::build(entry_type, amount, category_id, person.trim(), date);
        new_debt.transaction_id = form.transaction_id;
        new_debt.description = form
            .description
            .map(|description| description.trim().to_owned())
            .filter(|description| !description.is_empty());

        Ok(new_debt)
    }
}

/// The filters accepted by the debt listing, all optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DebtFilter {
    pub id: Option<DebtId>,
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    pub category_id: Option<CategoryId>,
    pub transaction_id: Option<TransactionId>,
    pub person: Option<String>,
    pub status: Option<DebtStatus>,
    pub date: Option<Date>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new unpaid debt.
///
/// Only income (receivable) debts may link to a transaction, and the linked
/// transaction must be an outcome that exists and was not recorded by a
/// settlement. The debt amount is then checked against what is still pending
/// on the transaction according to `pending_limit`.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] or [Error::EmptyPerson] for invalid fields,
/// - [Error::InvalidCategory] or [Error::CategoryTypeMismatch] for an unusable category,
/// - [Error::PayableDebtLink], [Error::InvalidTransactionLink],
///   [Error::SettlementTransactionLink] or [Error::DebtLinkTypeMismatch] for an
///   unusable transaction link,
/// - [Error::DebtExceedsPending] if the amount is too large and the limit is enforced,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_debt(
    new_debt: NewDebt,
    pending_limit: PendingLimitPolicy,
    connection: &Connection,
) -> Result<Debt, Error> {
    Amount::positive(new_debt.amount.value())?;

    if new_debt.person.trim().is_empty() {
        return Err(Error::EmptyPerson);
    }

    let sql_transaction = connection.unchecked_transaction()?;

    get_category_for_entry(new_debt.category_id, new_debt.entry_type, &sql_transaction)?;

    if let Some(transaction_id) = new_debt.transaction_id {
        if new_debt.entry_type == EntryType::Outcome {
            return Err(Error::PayableDebtLink(transaction_id));
        }

        let transaction =
            get_transaction(transaction_id, &sql_transaction).map_err(|error| match error {
                Error::NotFound => Error::InvalidTransactionLink(transaction_id),
                error => error,
            })?;

        if transaction.source_debt_id.is_some() {
            return Err(Error::SettlementTransactionLink(transaction_id));
        }

        if transaction.entry_type != EntryType::Outcome {
            return Err(Error::DebtLinkTypeMismatch {
                debt_type: new_debt.entry_type,
                transaction_type: transaction.entry_type,
            });
        }

        let pending = PendingAmount::of(&transaction)?.pending;

        if new_debt.amount > pending {
            match pending_limit {
                PendingLimitPolicy::Enforce => {
                    return Err(Error::DebtExceedsPending {
                        transaction_id,
                        amount: new_debt.amount,
                        pending,
                    });
                }
                PendingLimitPolicy::Advisory => tracing::warn!(
                    "debt of {} for {} is larger than the {pending} pending on transaction {transaction_id}",
                    new_debt.amount,
                    new_debt.person
                ),
            }
        }
    }

    let debt = sql_transaction
        .prepare(
            "INSERT INTO debt (type, amount, category_id, transaction_id, person, description, date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING id, type, amount, category_id, transaction_id, person, description, date, status",
        )?
        .query_row(
            (
                new_debt.entry_type,
                new_debt.amount,
                new_debt.category_id,
                new_debt.transaction_id,
                new_debt.person.trim(),
                &new_debt.description,
                new_debt.date,
                DebtStatus::Unpaid,
            ),
            map_debt_row,
        )?;

    sql_transaction.commit()?;

    Ok(debt)
}

/// Retrieve a debt by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid debt.
pub fn get_debt(id: DebtId, connection: &Connection) -> Result<Debt, Error> {
    let debt = connection
        .prepare(
            "SELECT id, type, amount, category_id, transaction_id, person, description, date, status
             FROM debt WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_debt_row)?;

    Ok(debt)
}

/// Get the debts matching `filter`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn query_debts(filter: &DebtFilter, connection: &Connection) -> Result<Vec<Debt>, Error> {
    let mut where_clause_parts = vec![];
    let mut query_parameters = vec![];

    if let Some(id) = filter.id {
        query_parameters.push(Value::Integer(id));
        where_clause_parts.push(format!("id = ?{}", query_parameters.len()));
    }

    if let Some(entry_type) = filter.entry_type {
        query_parameters.push(Value::Integer(entry_type.as_bool().into()));
        where_clause_parts.push(format!("type = ?{}", query_parameters.len()));
    }

    if let Some(category_id) = filter.category_id {
        query_parameters.push(Value::Integer(category_id));
        where_clause_parts.push(format!("category_id = ?{}", query_parameters.len()));
    }

    if let Some(transaction_id) = filter.transaction_id {
        query_parameters.push(Value::Integer(transaction_id));
        where_clause_parts.push(format!("transaction_id = ?{}", query_parameters.len()));
    }

    if let Some(person) = filter.person.as_deref().filter(|p| !p.trim().is_empty()) {
        query_parameters.push(Value::Text(person.trim().to_owned()));
        where_clause_parts.push(format!("person = ?{} COLLATE NOCASE", query_parameters.len()));
    }

    if let Some(status) = filter.status {
        query_parameters.push(Value::Integer((status == DebtStatus::Paid).into()));
        where_clause_parts.push(format!("status = ?{}", query_parameters.len()));
    }

    if let Some(date) = filter.date {
        query_parameters.push(Value::Text(date.to_string()));
        where_clause_parts.push(format!("date = ?{}", query_parameters.len()));
    }

    let mut query = String::from(
        "SELECT id, type, amount, category_id, transaction_id, person, description, date, status
         FROM debt",
    );

    if !where_clause_parts.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&where_clause_parts.join(" AND "));
    }

    query.push_str(" ORDER BY id DESC");

    connection
        .prepare(&query)?
        .query_map(params_from_iter(query_parameters.iter()), map_debt_row)?
        .map(|maybe_debt| maybe_debt.map_err(|error| error.into()))
        .collect()
}

/// Delete a debt by its `id`.
///
/// A linked transaction stops listing the debt, which also removes its effect
/// on the transaction's net amount if it was paid.
///
/// # Errors
/// Returns [Error::DeleteMissingDebt] if `id` does not refer to a valid debt.
pub fn delete_debt(id: DebtId, connection: &Connection) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let rows_affected = sql_transaction.execute("DELETE FROM debt WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingDebt);
    }

    sql_transaction.commit()?;

    Ok(())
}

/// Create the debt table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_debt_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS debt (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type INTEGER NOT NULL CHECK (type IN (0, 1)),
                amount TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                transaction_id INTEGER,
                person TEXT NOT NULL,
                description TEXT,
                date TEXT NOT NULL,
                status INTEGER NOT NULL DEFAULT 0 CHECK (status IN (0, 1)),
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON DELETE SET NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_debt_transaction ON debt(transaction_id);",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_debt_row(row: &Row) -> Result<Debt, rusqlite::Error> {
    Ok(Debt {
        id: row.get(0)?,
        entry_type: row.get(1)?,
        amount: row.get(2)?,
        category_id: row.get(3)?,
        transaction_id: row.get(4)?,
        person: row.get(5)?,
        description: row.get(6)?,
        date: row.get(7)?,
        status: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod status_tests {
    use serde::Deserialize;

    use crate::debt::DebtStatus;

    #[derive(Deserialize)]
    struct Wrapper {
        status: DebtStatus,
    }

    fn parse(json: &str) -> DebtStatus {
        serde_json::from_str::<Wrapper>(json).unwrap().status
    }

    #[test]
    fn accepts_text_boolean_and_integer_forms() {
        assert_eq!(parse(r#"{"status": "paid"}"#), DebtStatus::Paid);
        assert_eq!(parse(r#"{"status": false}"#), DebtStatus::Unpaid);
        assert_eq!(parse(r#"{"status": true}"#), DebtStatus::Paid);
        assert_eq!(parse(r#"{"status": 0}"#), DebtStatus::Unpaid);
    }

    #[test]
    fn serializes_as_lowercase_text() {
        assert_eq!(
            serde_json::to_string(&DebtStatus::Unpaid).unwrap(),
            "\"unpaid\""
        );
    }
}
