//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    amount::Amount,
    category::get_category_for_entry,
    database_id::{CategoryId, DebtId, TransactionId},
    debt::DebtStatus,
    entry_type::EntryType,
    transaction::{TransactionFilter, query_transactions},
};

// ============================================================================
// MODELS
// ============================================================================

/// An income or outcome, i.e. an event where money was either earned or spent.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// The gross amount of money earned or spent, always positive.
    pub amount: Amount,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// The debt whose settlement recorded this transaction, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_debt_id: Option<DebtId>,
    /// The debts that link to this transaction, ordered by ID.
    ///
    /// This is derived from the debt table and never stored on the transaction.
    #[serde(default)]
    pub debts: Vec<TransactionDebt>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        entry_type: EntryType,
        amount: Amount,
        category_id: CategoryId,
        date: Date,
    ) -> NewTransaction {
        NewTransaction {
            entry_type,
            amount,
            category_id,
            description: String::new(),
            date,
            source_debt_id: None,
        }
    }
}

/// A debt as seen from the transaction it links to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDebt {
    /// The ID of the debt.
    pub id: DebtId,
    /// The amount of the debt.
    pub amount: Amount,
    /// Whether the debt has been paid.
    pub status: DebtStatus,
    /// Who owes or is owed the money.
    pub person: String,
    /// An optional note about the debt.
    pub description: Option<String>,
}

/// The fields of a transaction before it is stored.
///
/// Also used as the full replacement when a transaction is edited.
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    /// Whether money was earned or spent.
    pub entry_type: EntryType,
    /// The gross amount, must be greater than zero.
    pub amount: Amount,
    /// The category, which must accept `entry_type`.
    pub category_id: CategoryId,
    /// Defaults to an empty string.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// Only set for transactions recorded by settling a debt.
    pub source_debt_id: Option<DebtId>,
}

impl NewTransaction {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Mark the transaction as recorded by settling the debt `debt_id`.
    pub(crate) fn source_debt_id(mut self, debt_id: DebtId) -> Self {
        self.source_debt_id = Some(debt_id);
        self
    }

    fn validate(&self, connection: &Connection) -> Result<(), Error> {
        Amount::positive(self.amount.value())?;
        get_category_for_entry(self.category_id, self.entry_type, connection)?;

        Ok(())
    }
}

/// Request body for transaction creation and editing.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionForm {
    #[serde(default, rename = "type")]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<Date>,
}

impl TryFrom<TransactionForm> for NewTransaction {
    type Error = Error;

    fn try_from(form: TransactionForm) -> Result<Self, Self::Error> {
        let entry_type = form.entry_type.ok_or(Error::MissingField("type"))?;
        let amount = form.amount.ok_or(Error::MissingField("amount"))?;
        let amount = Amount::positive(amount.value())?;
        let category_id = form.category_id.ok_or(Error::MissingField("category_id"))?;
        let date = form.date.ok_or(Error::MissingField("date"))?;

        Ok(
            Transaction::build(entry_type, amount, category_id, date)
                .description(form.description.as_deref().unwrap_or_default().trim()),
        )
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::InvalidCategory] or [Error::CategoryTypeMismatch] if the category
///   does not exist or does not accept the transaction's type,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let transaction = insert_transaction(new_transaction, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(transaction)
}

/// Validate and insert a transaction without opening an SQL transaction.
///
/// For use inside a larger atomic unit, e.g. settling a debt.
pub(crate) fn insert_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    new_transaction.validate(connection)?;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (type, amount, category_id, description, date, source_debt_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, type, amount, category_id, description, date, source_debt_id",
        )?
        .query_row(
            (
                new_transaction.entry_type,
                new_transaction.amount,
                new_transaction.category_id,
                &new_transaction.description,
                new_transaction.date,
                new_transaction.source_debt_id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction and its linked debts from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let filter = TransactionFilter {
        id: Some(id),
        ..Default::default()
    };

    query_transactions(&filter, connection)?
        .into_iter()
        .next()
        .ok_or(Error::NotFound)
}

/// Replace every editable field of the transaction `id`.
///
/// Returns the updated transaction with its linked debts.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a valid transaction,
/// - [Error::LinkedTransactionTypeChange] if the type changes while debts link to it,
/// - the validation errors of [create_transaction],
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    replacement: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let existing = get_transaction(id, &sql_transaction).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingTransaction,
        error => error,
    })?;

    if existing.entry_type != replacement.entry_type && !existing.debts.is_empty() {
        return Err(Error::LinkedTransactionTypeChange(id));
    }

    replacement.validate(&sql_transaction)?;

    sql_transaction.execute(
        "UPDATE \"transaction\"
        SET type = ?1, amount = ?2, category_id = ?3, description = ?4, date = ?5
        WHERE id = ?6",
        (
            replacement.entry_type,
            replacement.amount,
            replacement.category_id,
            &replacement.description,
            replacement.date,
            id,
        ),
    )?;

    sql_transaction.commit()?;

    get_transaction(id, connection)
}

/// Delete the transaction `id`, detaching any debts that link to it.
///
/// The debts themselves are kept with their link cleared. Returns the IDs of
/// the detached debts.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Vec<DebtId>, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let detached_debt_ids = sql_transaction
        .prepare("SELECT id FROM debt WHERE transaction_id = ?1 ORDER BY id ASC")?
        .query_map([id], |row| row.get(0))?
        .collect::<Result<Vec<DebtId>, rusqlite::Error>>()?;

    sql_transaction.execute(
        "UPDATE debt SET transaction_id = NULL WHERE transaction_id = ?1",
        [id],
    )?;

    let rows_affected =
        sql_transaction.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    sql_transaction.commit()?;

    if !detached_debt_ids.is_empty() {
        tracing::info!(
            "detached debts {detached_debt_ids:?} from deleted transaction {id}"
        );
    }

    Ok(detached_debt_ids)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type INTEGER NOT NULL CHECK (type IN (0, 1)),
                amount TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL,
                source_debt_id INTEGER,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(source_debt_id) REFERENCES debt(id) ON DELETE SET NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction without its debts.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let entry_type = row.get(1)?;
    let amount = row.get(2)?;
    let category_id = row.get(3)?;
    let description = row.get(4)?;
    let date = row.get(5)?;
    let source_debt_id = row.get(6)?;

    Ok(Transaction {
        id,
        entry_type,
        amount,
        category_id,
        description,
        date,
        source_debt_id,
        debts: Vec::new(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
