//! HTTP handlers for the summary metrics and chart series.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    category::{Category, get_categories},
    db::lock_connection,
    reconciliation::{
        AmountBasis, CategoryBreakdownEntry, CategoryEvolution, MonthlyFlow, Period,
        SummaryMetrics, category_breakdown, category_evolution, monthly_flows, summarize,
    },
    timezone::local_today,
    transaction::{Transaction, TransactionFilter, TransactionOrder, query_transactions},
};

/// The state needed by the reconciliation endpoints.
#[derive(Debug, Clone)]
pub struct ReconciliationState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone that decides which day "today" is.
    pub local_timezone: String,
    /// Whether outcome series use gross or net amounts.
    pub chart_basis: AmountBasis,
}

impl FromRef<AppState> for ReconciliationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            chart_basis: state.config.chart_basis,
        }
    }
}

/// The `?period=` query string, defaults to monthly.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: Period,
}

/// The ledger data for one period evaluated on today's date.
struct PeriodData {
    today: Date,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
}

fn load_period(state: &ReconciliationState, period: Period) -> Result<PeriodData, Error> {
    let today = local_today(&state.local_timezone)?;
    let window = period.window(today);
    let filter = TransactionFilter {
        from: Some(window.start),
        to: Some(window.end),
        order: TransactionOrder::DateAsc,
        ..Default::default()
    };

    let connection = lock_connection(&state.db_connection)?;
    let transactions = query_transactions(&filter, &connection)?;
    let categories = get_categories(None, &connection)?;

    Ok(PeriodData {
        today,
        transactions,
        categories,
    })
}

/// Get the summary metrics for the period.
pub async fn summary_endpoint(
    State(state): State<ReconciliationState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<SummaryMetrics>, Error> {
    let Query(PeriodQuery { period }) = query?;
    let data = load_period(&state, period)?;

    Ok(Json(summarize(&data.transactions, period, data.today)?))
}

/// Get the net outcomes per category for the period.
pub async fn category_breakdown_endpoint(
    State(state): State<ReconciliationState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<Vec<CategoryBreakdownEntry>>, Error> {
    let Query(PeriodQuery { period }) = query?;
    let data = load_period(&state, period)?;

    Ok(Json(category_breakdown(
        &data.transactions,
        &data.categories,
        period,
        data.today,
    )?))
}

/// Get the cumulative outcomes per category for the period.
pub async fn category_evolution_endpoint(
    State(state): State<ReconciliationState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<CategoryEvolution>, Error> {
    let Query(PeriodQuery { period }) = query?;
    let data = load_period(&state, period)?;

    Ok(Json(category_evolution(
        &data.transactions,
        &data.categories,
        period,
        data.today,
        state.chart_basis,
    )?))
}

/// Get the income and outcomes of each month this year.
pub async fn monthly_flow_endpoint(
    State(state): State<ReconciliationState>,
) -> Result<Json<Vec<MonthlyFlow>>, Error> {
    let data = load_period(&state, Period::Yearly)?;

    Ok(Json(monthly_flows(
        &data.transactions,
        data.today,
        state.chart_basis,
    )?))
}
