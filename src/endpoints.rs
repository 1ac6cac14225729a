//! The API endpoints URIs.
//!
//! Endpoints that act on a single entity take its ID as the `?id=` query
//! parameter, e.g., `/api/debts?id=3`.

/// The route to list, create, update and delete categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to list, create, update and delete transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to get the pending amount of a transaction.
pub const TRANSACTIONS_PENDING: &str = "/api/transactions/pending";
/// The route to list, create, settle and delete debts.
pub const DEBTS: &str = "/api/debts";
/// The route to get the summary metrics for a period.
pub const SUMMARY: &str = "/api/summary";
/// The route to get the outcome breakdown by category.
pub const CHARTS_CATEGORIES: &str = "/api/charts/categories";
/// The route to get the cumulative outcomes per category.
pub const CHARTS_EVOLUTION: &str = "/api/charts/evolution";
/// The route to get the income and outcomes of each month this year.
pub const CHARTS_MONTHLY: &str = "/api/charts/monthly";
