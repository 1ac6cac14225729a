//! The transaction ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` for creating transactions
//! - Database functions for storing, querying, and deleting transactions
//! - JSON endpoints for the transaction API

mod core;
mod endpoints;
mod query;

pub use core::{
    NewTransaction, Transaction, TransactionDebt, TransactionForm, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, map_transaction_row,
    update_transaction,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_pending_amount_endpoint,
    list_transactions_endpoint, update_transaction_endpoint,
};
pub use query::{TransactionFilter, TransactionOrder, query_transactions};

pub(crate) use core::insert_transaction;
