//! Debt Ledger is a personal finance tracker with debt reconciliation.
//!
//! Users log income and outcome transactions, categorize them, and track debts
//! (money owed to them or by them). A debt may link to a transaction, in which
//! case settling the debt reduces that transaction's net effective amount.
//! Settling an unlinked debt records a new transaction instead.
//!
//! This library provides a JSON API over a SQLite database, plus the
//! read-only reconciliation engine that derives summary metrics and chart
//! series from the ledger.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::signal;

mod amount;
mod api;
mod app_state;
mod category;
mod config;
mod database_id;
mod db;
mod debt;
mod endpoints;
mod entry_type;
mod logging;
mod reconciliation;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use amount::{Amount, MAX_AMOUNT, MAX_AMOUNT_SCALE};
pub use app_state::AppState;
pub use category::{Category, CategoryName, DefaultCategory};
pub use config::{LedgerConfig, PendingLimitPolicy};
pub use database_id::{CategoryId, DatabaseId, DebtId, TransactionId};
pub use db::initialize as initialize_db;
pub use debt::{Debt, DebtStatus, NewDebt, Settlement, SettlementEffect};
pub use entry_type::EntryType;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use reconciliation::{AmountBasis, Period};
pub use routing::build_router;
pub use timezone::validate_timezone;
pub use transaction::{NewTransaction, Transaction, TransactionDebt};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The broad classes of failure that callers of the ledger need to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid input, rejected before the database is modified.
    Validation,
    /// The targeted entity does not exist.
    NotFound,
    /// The request conflicts with the stored state, e.g. a constraint violation.
    Conflict,
    /// The targeted entity is reserved and cannot be modified this way.
    ProtectedEntity,
    /// An unexpected failure inside an atomic unit of work, which was rolled back.
    TransactionFailure,
}

impl ErrorKind {
    /// The HTTP status code that represents this kind of error.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::ProtectedEntity => StatusCode::FORBIDDEN,
            ErrorKind::TransactionFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing from the request.
    #[error("the field \"{0}\" is required")]
    MissingField(&'static str),

    /// The request body or query string could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A string could not be parsed as income or outcome.
    #[error("\"{0}\" is not a valid type, expected \"income\" or \"outcome\"")]
    InvalidEntryType(String),

    /// A string could not be parsed as a decimal amount.
    #[error("invalid amount {0}")]
    InvalidAmount(String),

    /// Ledger entries must have an amount greater than zero.
    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Ledger entries may not have more than [MAX_AMOUNT_SCALE] decimal places.
    #[error("amount {0} has more than {MAX_AMOUNT_SCALE} decimal places")]
    AmountTooPrecise(Decimal),

    /// Ledger entries may not be larger than [MAX_AMOUNT].
    #[error("amount {0} is larger than the maximum of {MAX_AMOUNT}")]
    AmountTooLarge(Decimal),

    /// A sum or ratio of amounts could not be represented.
    #[error("amount arithmetic overflowed")]
    AmountOverflow,

    /// An empty string was used as a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used as a category color.
    #[error("category color cannot be empty")]
    EmptyCategoryColor,

    /// An empty string was used as the person on a debt.
    #[error("the person on a debt cannot be empty")]
    EmptyPerson,

    /// The category ID did not match a valid category.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The category cannot be used for entries of the given type.
    #[error("the {category_type} category {category_id} cannot be used for an {entry_type} entry")]
    CategoryTypeMismatch {
        /// The category that was requested.
        category_id: CategoryId,
        /// The type of that category.
        category_type: EntryType,
        /// The type of the transaction or debt.
        entry_type: EntryType,
    },

    /// A category's type cannot be changed once it has been created.
    #[error("the type of category {0} cannot be changed")]
    CategoryTypeChange(CategoryId),

    /// The default categories cannot be deleted.
    #[error("category {0} is a default category and cannot be deleted")]
    ProtectedCategory(CategoryId),

    /// The category is still referenced by transactions or debts.
    #[error("category {0} is still used by transactions or debts")]
    CategoryInUse(CategoryId),

    /// The transaction ID on a new debt did not match a valid transaction.
    #[error("the transaction ID {0} does not refer to a valid transaction")]
    InvalidTransactionLink(TransactionId),

    /// Only receivable (income) debts may be linked to a transaction.
    #[error("an outcome debt cannot be linked to transaction {0}")]
    PayableDebtLink(TransactionId),

    /// A receivable debt may only be linked to an outcome transaction.
    #[error("an {debt_type} debt cannot be linked to an {transaction_type} transaction")]
    DebtLinkTypeMismatch {
        /// The type of the debt.
        debt_type: EntryType,
        /// The type of the transaction it was linked to.
        transaction_type: EntryType,
    },

    /// Transactions recorded by settling a debt cannot be linked to other debts.
    #[error("transaction {0} records a debt payment and cannot be linked to a debt")]
    SettlementTransactionLink(TransactionId),

    /// The debt amount is larger than what is still pending on the linked transaction.
    #[error(
        "debt amount {amount} is larger than the {pending} still pending on transaction {transaction_id}"
    )]
    DebtExceedsPending {
        /// The linked transaction.
        transaction_id: TransactionId,
        /// The amount of the new debt.
        amount: Amount,
        /// The amount still pending on the transaction.
        pending: Amount,
    },

    /// A transaction with linked debts cannot change its type.
    #[error("transaction {0} has linked debts, so its type cannot be changed")]
    LinkedTransactionTypeChange(TransactionId),

    /// The debt has already been paid.
    #[error("debt {0} has already been paid")]
    DebtAlreadyPaid(DebtId),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete a debt that does not exist
    #[error("tried to delete a debt that is not in the database")]
    DeleteMissingDebt,

    /// Tried to settle a debt that does not exist
    #[error("tried to settle a debt that is not in the database")]
    SettleMissingDebt,

    /// A database constraint rejected the change.
    #[error("the change violates a database constraint: {0}")]
    ConstraintViolation(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingField(_)
            | Error::InvalidRequest(_)
            | Error::InvalidEntryType(_)
            | Error::InvalidAmount(_)
            | Error::NonPositiveAmount(_)
            | Error::AmountTooPrecise(_)
            | Error::AmountTooLarge(_)
            | Error::EmptyCategoryName
            | Error::EmptyCategoryColor
            | Error::EmptyPerson
            | Error::InvalidCategory(_)
            | Error::CategoryTypeMismatch { .. }
            | Error::InvalidTransactionLink(_)
            | Error::PayableDebtLink(_)
            | Error::DebtLinkTypeMismatch { .. }
            | Error::SettlementTransactionLink(_)
            | Error::DebtExceedsPending { .. } => ErrorKind::Validation,
            Error::NotFound
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::DeleteMissingDebt
            | Error::SettleMissingDebt => ErrorKind::NotFound,
            Error::CategoryTypeChange(_)
            | Error::CategoryInUse(_)
            | Error::LinkedTransactionTypeChange(_)
            | Error::DebtAlreadyPaid(_)
            | Error::ConstraintViolation(_) => ErrorKind::Conflict,
            Error::ProtectedCategory(_) => ErrorKind::ProtectedEntity,
            Error::InvalidTimezoneError(_)
            | Error::AmountOverflow
            | Error::DatabaseLockError
            | Error::SqlError(_) => ErrorKind::TransactionFailure,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::SqliteFailure(sql_error, description)
                if sql_error.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let description =
                    description.unwrap_or_else(|| "constraint violation".to_owned());
                tracing::warn!("a database constraint rejected a change: {description}");
                Error::ConstraintViolation(description)
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The body of every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let kind = self.kind();

        let message = match kind {
            // Details of unexpected errors are for the server logs, not the client.
            ErrorKind::TransactionFailure => {
                tracing::error!("An unexpected error occurred: {}", self);
                "Transaction failed, check the server logs for more details".to_owned()
            }
            _ => self.to_string(),
        };

        (kind.status_code(), Json(ErrorBody { message })).into_response()
    }
}
