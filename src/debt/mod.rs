//! The debt ledger: money owed to me or by me, optionally linked to a transaction.

mod core;
mod endpoints;
mod settle;

pub use core::{
    Debt, DebtFilter, DebtForm, DebtStatus, NewDebt, create_debt, create_debt_table, delete_debt,
    get_debt, query_debts,
};
pub use endpoints::{
    create_debt_endpoint, delete_debt_endpoint, list_debts_endpoint, settle_debt_endpoint,
};
pub use settle::{Settlement, SettlementEffect, settle_debt};
