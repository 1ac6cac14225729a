//! Settling debts and the side effects that settlement has on the ledger.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    category::DefaultCategory,
    database_id::DebtId,
    debt::{Debt, DebtStatus, get_debt},
    transaction::{Transaction, get_transaction, insert_transaction},
};

/// What settling a debt did to the transaction ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", content = "transaction", rename_all = "snake_case")]
pub enum SettlementEffect {
    /// The debt was linked, so no transaction was created. Holds the linked
    /// transaction as re-read after the debt was paid, whose net amount now
    /// reflects the payment.
    LinkedTransactionUpdated(Transaction),
    /// The debt was not linked, so the payment was recorded as a new
    /// transaction in [DefaultCategory::DebtPayments].
    TransactionCreated(Transaction),
}

impl SettlementEffect {
    /// The transaction that was updated or created.
    pub fn transaction(&self) -> &Transaction {
        match self {
            SettlementEffect::LinkedTransactionUpdated(transaction)
            | SettlementEffect::TransactionCreated(transaction) => transaction,
        }
    }
}

/// The result of settling a debt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    /// The debt after it was marked as paid.
    pub debt: Debt,
    /// The change to the transaction ledger.
    #[serde(flatten)]
    pub effect: SettlementEffect,
}

/// The description of a transaction recorded by settling `debt`, e.g.
/// "Debt paid: Bob - Concert tickets".
pub fn settlement_description(debt: &Debt) -> String {
    match debt.description.as_deref().filter(|d| !d.is_empty()) {
        Some(description) => format!("Debt paid: {} - {description}", debt.person),
        None => format!("Debt paid: {}", debt.person),
    }
}

/// Mark the debt `id` as paid and apply the side effect on the ledger.
///
/// A linked debt reduces the net amount of its transaction and nothing else
/// changes. An unlinked debt is recorded as a new transaction of the debt's
/// type and amount, dated `today`. The status change and the side effect are
/// committed together or not at all.
///
/// # Errors
/// This function will return a:
/// - [Error::SettleMissingDebt] if `id` does not refer to a valid debt,
/// - [Error::DebtAlreadyPaid] if the debt was settled before,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn settle_debt(id: DebtId, today: Date, connection: &Connection) -> Result<Settlement, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let mut debt = get_debt(id, &sql_transaction).map_err(|error| match error {
        Error::NotFound => Error::SettleMissingDebt,
        error => error,
    })?;

    if debt.status == DebtStatus::Paid {
        return Err(Error::DebtAlreadyPaid(id));
    }

    sql_transaction.execute(
        "UPDATE debt SET status = ?1 WHERE id = ?2",
        (DebtStatus::Paid, id),
    )?;
    debt.status = DebtStatus::Paid;

    let effect = match debt.transaction_id {
        Some(transaction_id) => {
            let transaction = get_transaction(transaction_id, &sql_transaction)?;
            SettlementEffect::LinkedTransactionUpdated(transaction)
        }
        None => {
            let new_transaction = Transaction::build(
                debt.entry_type,
                debt.amount,
                DefaultCategory::DebtPayments.id(),
                today,
            )
            .description(&settlement_description(&debt))
            .source_debt_id(debt.id);

            SettlementEffect::TransactionCreated(insert_transaction(
                new_transaction,
                &sql_transaction,
            )?)
        }
    };

    sql_transaction.commit()?;

    tracing::info!(
        "settled debt {id}, {} transaction {}",
        match &effect {
            SettlementEffect::LinkedTransactionUpdated(_) => "updated",
            SettlementEffect::TransactionCreated(_) => "created",
        },
        effect.transaction().id
    );

    Ok(Settlement { debt, effect })
}
