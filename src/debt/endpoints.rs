//! HTTP handlers for the debt ledger.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{
        FromRef, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    api::{Action, ApiResponse, Entity, IdQuery},
    config::PendingLimitPolicy,
    db::lock_connection,
    debt::{
        Debt, DebtFilter, DebtForm, NewDebt, Settlement, create_debt, delete_debt, query_debts,
        settle_debt,
    },
    timezone::local_today,
};

/// The state needed by the debt endpoints.
#[derive(Debug, Clone)]
pub struct DebtState {
    /// The database connection for managing debts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to date the transactions created by settlements.
    pub local_timezone: String,
    /// How new debts are checked against the pending amount of their transaction.
    pub pending_limit: PendingLimitPolicy,
}

impl FromRef<AppState> for DebtState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            pending_limit: state.config.pending_limit,
        }
    }
}

/// List debts newest first, see [DebtFilter] for the query string.
pub async fn list_debts_endpoint(
    State(state): State<DebtState>,
    filter: Result<Query<DebtFilter>, QueryRejection>,
) -> Result<Json<Vec<Debt>>, Error> {
    let Query(filter) = filter?;
    let connection = lock_connection(&state.db_connection)?;

    query_debts(&filter, &connection).map(Json)
}

/// Create an unpaid debt from a JSON body.
pub async fn create_debt_endpoint(
    State(state): State<DebtState>,
    payload: Result<Json<DebtForm>, JsonRejection>,
) -> Result<ApiResponse<Debt>, Error> {
    let Json(form) = payload?;
    let new_debt = NewDebt::try_from(form)?;
    let connection = lock_connection(&state.db_connection)?;

    let debt = create_debt(new_debt, state.pending_limit, &connection)?;
    tracing::info!("created {} debt {} with {}", debt.entry_type, debt.id, debt.person);

    Ok(ApiResponse::success(Entity::Debt, Action::Create, debt))
}

/// Settle the debt given by `?id=`.
///
/// Responds with the paid debt and the transaction that was updated or created.
pub async fn settle_debt_endpoint(
    State(state): State<DebtState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<ApiResponse<Settlement>, Error> {
    let debt_id = query?.require()?;
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let settlement = settle_debt(debt_id, today, &connection)?;

    Ok(ApiResponse::success(Entity::Debt, Action::Pay, settlement))
}

/// Delete the debt given by `?id=`.
pub async fn delete_debt_endpoint(
    State(state): State<DebtState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<ApiResponse<()>, Error> {
    let debt_id = query?.require()?;
    let connection = lock_connection(&state.db_connection)?;

    delete_debt(debt_id, &connection)?;

    Ok(ApiResponse::without_data(Entity::Debt, Action::Delete))
}
