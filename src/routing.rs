//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::{
    ActionResponse, AppState,
    category::get_categories,
    dashboard::get_dashboard_endpoint,
    endpoints,
    settings::{get_settings_endpoint, save_settings_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, get_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route except [endpoints::HEALTH] and [endpoints::CATEGORIES] needs
/// the identity headers described in [crate::identity].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::CATEGORIES, get(get_categories))
        .route(
            endpoints::TRANSACTIONS_API,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::SETTINGS,
            get(get_settings_endpoint).post(save_settings_endpoint),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        ActionResponse::error("Rota não encontrada"),
    )
        .into_response()
}
