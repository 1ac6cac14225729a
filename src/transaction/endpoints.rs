//! HTTP handlers for the transaction ledger.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{
        FromRef, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    api::{Action, ApiResponse, Entity, IdQuery},
    database_id::{DebtId, TransactionId},
    db::lock_connection,
    reconciliation::PendingAmount,
    transaction::{
        NewTransaction, Transaction, TransactionFilter, TransactionForm, create_transaction,
        delete_transaction, get_transaction, query_transactions, update_transaction,
    },
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The result of deleting a transaction.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DeletedTransaction {
    pub id: TransactionId,
    /// The debts that linked to the transaction and now link to nothing.
    pub detached_debt_ids: Vec<DebtId>,
}

/// List transactions with their debts, see [TransactionFilter] for the query string.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    filter: Result<Query<TransactionFilter>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let Query(filter) = filter?;
    let connection = lock_connection(&state.db_connection)?;

    query_transactions(&filter, &connection).map(Json)
}

/// Create a transaction from a JSON body.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    payload: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<ApiResponse<Transaction>, Error> {
    let Json(form) = payload?;
    let new_transaction = NewTransaction::try_from(form)?;
    let connection = lock_connection(&state.db_connection)?;

    let transaction = create_transaction(new_transaction, &connection)?;
    tracing::info!(
        "created {} transaction {} for {}",
        transaction.entry_type,
        transaction.id,
        transaction.amount
    );

    Ok(ApiResponse::success(
        Entity::Transaction,
        Action::Create,
        transaction,
    ))
}

/// Replace the transaction given by `?id=`.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    query: Result<Query<IdQuery>, QueryRejection>,
    payload: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<ApiResponse<Transaction>, Error> {
    let transaction_id = query?.require()?;
    let Json(form) = payload?;
    let replacement = NewTransaction::try_from(form)?;
    let connection = lock_connection(&state.db_connection)?;

    let transaction = update_transaction(transaction_id, replacement, &connection)?;

    Ok(ApiResponse::success(
        Entity::Transaction,
        Action::Update,
        transaction,
    ))
}

/// Delete the transaction given by `?id=`, detaching its debts.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<ApiResponse<DeletedTransaction>, Error> {
    let transaction_id = query?.require()?;
    let connection = lock_connection(&state.db_connection)?;

    let detached_debt_ids = delete_transaction(transaction_id, &connection)?;

    Ok(ApiResponse::success(
        Entity::Transaction,
        Action::Delete,
        DeletedTransaction {
            id: transaction_id,
            detached_debt_ids,
        },
    ))
}

/// Get the gross, settled and pending amounts of the transaction given by `?id=`.
pub async fn get_pending_amount_endpoint(
    State(state): State<TransactionState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<PendingAmount>, Error> {
    let transaction_id = query?.require()?;
    let connection = lock_connection(&state.db_connection)?;

    let transaction = get_transaction(transaction_id, &connection)?;

    Ok(Json(PendingAmount::of(&transaction)?))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use serde_json::json;
    use time::macros::date;

    use crate::{
        DefaultCategory, EntryType,
        amount::must_parse,
        api::IdQuery,
        config::PendingLimitPolicy,
        db::must_create_test_connection,
        debt::{NewDebt, create_debt, settle_debt},
        test_utils::parse_json_body,
        transaction::{
            Transaction, create_transaction,
            core::TransactionForm,
            endpoints::{
                TransactionState, create_transaction_endpoint, delete_transaction_endpoint,
                get_pending_amount_endpoint, update_transaction_endpoint,
            },
        },
    };

    fn get_state() -> TransactionState {
        TransactionState {
            db_connection: Arc::new(Mutex::new(must_create_test_connection())),
        }
    }

    fn form(amount: &str) -> TransactionForm {
        TransactionForm {
            entry_type: Some(EntryType::Outcome),
            amount: Some(must_parse(amount)),
            category_id: Some(DefaultCategory::Groceries.id()),
            description: Some("Weekly shop".to_owned()),
            date: Some(date!(2024 - 03 - 10)),
        }
    }

    #[tokio::test]
    async fn create_returns_transaction_with_no_debts() {
        let state = get_state();

        let response = create_transaction_endpoint(State(state), Ok(Json(form("100.00"))))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        assert_eq!(body["message"], "Transaction created successfully");
        assert_eq!(body["data"]["type"], "outcome");
        assert_eq!(body["data"]["amount"], "100.00");
        assert_eq!(body["data"]["date"], "2024-03-10");
        assert_eq!(body["data"]["debts"], json!([]));
    }

    #[tokio::test]
    async fn create_with_negative_amount_is_bad_request() {
        let state = get_state();

        let response = create_transaction_endpoint(State(state), Ok(Json(form("-5"))))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_without_date_is_bad_request() {
        let state = get_state();
        let form = TransactionForm {
            date: None,
            ..form("5")
        };

        let response = create_transaction_endpoint(State(state), Ok(Json(form)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_json_body(response).await;
        assert_eq!(body["message"], "the field \"date\" is required");
    }

    #[tokio::test]
    async fn update_missing_transaction_is_not_found() {
        let state = get_state();

        let response = update_transaction_endpoint(
            State(state),
            Ok(Query(IdQuery { id: Some(77) })),
            Ok(Json(form("1"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_reports_detached_debts() {
        let state = get_state();
        let (transaction_id, debt_id) = {
            let connection = state.db_connection.lock().unwrap();
            let transaction = create_transaction(
                Transaction::build(
                    EntryType::Outcome,
                    must_parse("100.00"),
                    DefaultCategory::Groceries.id(),
                    date!(2024 - 03 - 10),
                ),
                &connection,
            )
            .unwrap();
            let debt = create_debt(
                NewDebt::build(
                    EntryType::Income,
                    must_parse("30.00"),
                    DefaultCategory::DebtPayments.id(),
                    "Alice",
                    date!(2024 - 03 - 10),
                )
                .transaction_id(transaction.id),
                PendingLimitPolicy::Enforce,
                &connection,
            )
            .unwrap();
            (transaction.id, debt.id)
        };

        let response = delete_transaction_endpoint(
            State(state),
            Ok(Query(IdQuery {
                id: Some(transaction_id),
            })),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        assert_eq!(body["message"], "Transaction deleted successfully");
        assert_eq!(body["data"]["detached_debt_ids"], json!([debt_id]));
    }

    #[tokio::test]
    async fn pending_amount_subtracts_paid_debts_only() {
        let state = get_state();
        let transaction_id = {
            let connection = state.db_connection.lock().unwrap();
            let transaction = create_transaction(
                Transaction::build(
                    EntryType::Outcome,
                    must_parse("100.00"),
                    DefaultCategory::Groceries.id(),
                    date!(2024 - 03 - 10),
                ),
                &connection,
            )
            .unwrap();
            for (person, amount) in [("Alice", "30.00"), ("Bob", "20.00")] {
                let debt = create_debt(
                    NewDebt::build(
                        EntryType::Income,
                        must_parse(amount),
                        DefaultCategory::DebtPayments.id(),
                        person,
                        date!(2024 - 03 - 10),
                    )
                    .transaction_id(transaction.id),
                    PendingLimitPolicy::Enforce,
                    &connection,
                )
                .unwrap();
                if person == "Alice" {
                    settle_debt(debt.id, date!(2024 - 03 - 12), &connection).unwrap();
                }
            }
            transaction.id
        };

        let Json(pending) = get_pending_amount_endpoint(
            State(state),
            Ok(Query(IdQuery {
                id: Some(transaction_id),
            })),
        )
        .await
        .unwrap();

        assert_eq!(pending.gross, must_parse("100.00"));
        assert_eq!(pending.settled, must_parse("30.00"));
        assert_eq!(pending.anticipated, must_parse("20.00"));
        assert_eq!(pending.pending, must_parse("70.00"));
    }
}
