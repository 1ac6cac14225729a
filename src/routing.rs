//! Application router configuration for the JSON API.

use axum::{Router, routing::get};

use crate::{
    AppState, Error,
    category::{
        create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
        update_category_endpoint,
    },
    debt::{create_debt_endpoint, delete_debt_endpoint, list_debts_endpoint, settle_debt_endpoint},
    endpoints,
    reconciliation::{
        category_breakdown_endpoint, category_evolution_endpoint, monthly_flow_endpoint,
        summary_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_pending_amount_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint)
                .post(create_category_endpoint)
                .put(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint)
                .post(create_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_PENDING,
            get(get_pending_amount_endpoint),
        )
        .route(
            endpoints::DEBTS,
            get(list_debts_endpoint)
                .post(create_debt_endpoint)
                .put(settle_debt_endpoint)
                .delete(delete_debt_endpoint),
        )
        .route(endpoints::SUMMARY, get(summary_endpoint))
        .route(endpoints::CHARTS_CATEGORIES, get(category_breakdown_endpoint))
        .route(endpoints::CHARTS_EVOLUTION, get(category_evolution_endpoint))
        .route(endpoints::CHARTS_MONTHLY, get(monthly_flow_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
