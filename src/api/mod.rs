pub mod coins;
pub mod collections;
pub mod health;
pub mod mints;
pub mod types;
pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;

use crate::services::ServiceError;

pub fn api_router(db: DatabaseConnection) -> Router {
    Router::new()
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/stats", get(users::get_user_stats))
        // Coin catalog
        .route("/coins", get(coins::list_coins).post(coins::create_coin))
        .route(
            "/coins/:id",
            get(coins::get_coin)
                .put(coins::update_coin)
                .delete(coins::delete_coin),
        )
        // Coin types
        .route("/types", get(types::list_types).post(types::create_type))
        .route(
            "/types/:id",
            get(types::get_type)
                .put(types::update_type)
                .delete(types::delete_type),
        )
        // Mints
        .route("/mints", get(mints::list_mints).post(mints::create_mint))
        .route(
            "/mints/:id",
            get(mints::get_mint)
                .put(mints::update_mint)
                .delete(mints::delete_mint),
        )
        // Collection ledger
        .route(
            "/collections",
            get(collections::list_collections).post(collections::add_to_collection),
        )
        .route(
            "/collections/:id",
            get(collections::get_collection_item)
                .put(collections::update_collection_item)
                .delete(collections::delete_collection_item),
        )
        .route(
            "/collections/stats/:user_id",
            get(collections::get_collection_stats),
        )
        .with_state(db)
}

/// Translate a service error to the HTTP taxonomy. `resource` names the
/// entity shown in 404 bodies.
pub(crate) fn error_response(err: ServiceError, resource: &str) -> Response {
    match err {
        ServiceError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("{} not found", resource) })),
        )
            .into_response(),
        ServiceError::Validation(msg) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
        }
        ServiceError::Conflict(msg) => {
            (StatusCode::CONFLICT, Json(json!({ "error": msg }))).into_response()
        }
        ServiceError::Database(msg) => {
            tracing::error!("database error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}

/// Pagination block of the list envelope.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

/// page floors at 1; limit clamps to 1..=100 with a default of 20.
pub(crate) fn normalize_paging(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    (page.unwrap_or(1).max(1), limit.unwrap_or(20).clamp(1, 100))
}
