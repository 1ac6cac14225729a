//! Database initialization.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    category::{create_category_table, seed_default_categories},
    debt::create_debt_table,
    transaction::create_transaction_table,
};

/// Create the tables for the domain models and seed the default categories.
///
/// Foreign key enforcement is switched on for `connection`. Calling this
/// function on an already initialized database is a no-op.
///
/// # Errors
/// Returns an error if there is an SQL error. Nothing is created in that case.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must run outside of a transaction, where the pragma is silently ignored.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_debt_table(&transaction)?;
    seed_default_categories(&transaction)?;

    transaction.commit()?;

    tracing::debug!("database initialized");

    Ok(())
}

/// Acquire the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub(crate) fn lock_connection(
    db_connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

#[cfg(test)]
pub(crate) fn must_create_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize(&connection).expect("could not initialize test DB");

    connection
}
