use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use crate::api::{error_response, normalize_paging, Pagination};
use crate::services::collection_service::{
    self, AddOutcome, AddToCollectionInput, UpdateCollectionInput,
};
use crate::services::{stats_service, ServiceError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionsQuery {
    pub user_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCollectionRequest {
    pub user_id: Option<i32>,
    pub coin_id: Option<i32>,
    pub quantity: Option<i32>,
    pub condition: Option<String>,
    pub notes: Option<String>,
    pub paid_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollectionRequest {
    pub quantity: Option<i32>,
    pub condition: Option<String>,
    pub notes: Option<String>,
    pub paid_price: Option<f64>,
}

// Paginated ledger list for one user, newest first
pub async fn list_collections(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListCollectionsQuery>,
) -> impl IntoResponse {
    let user_id = params.user_id.unwrap_or(1);
    let (page, limit) = normalize_paging(params.page, params.limit);

    match collection_service::list_items(&db, user_id, page, limit).await {
        Ok((items, total)) => (
            StatusCode::OK,
            Json(json!({
                "data": items,
                "pagination": Pagination::new(page, limit, total),
            })),
        )
            .into_response(),
        Err(e) => error_response(e, "Collection item"),
    }
}

pub async fn get_collection_item(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match collection_service::get_item(&db, id).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => error_response(e, "Collection item"),
    }
}

// Add a coin to a collection; repeated adds of the same (user, coin,
// condition) merge into the existing row
pub async fn add_to_collection(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<AddToCollectionRequest>,
) -> impl IntoResponse {
    let coin_id = match payload.coin_id {
        Some(coin_id) => coin_id,
        None => {
            return error_response(
                ServiceError::Validation("Missing required field: coinId".to_string()),
                "Collection item",
            )
        }
    };

    let input = AddToCollectionInput {
        user_id: payload.user_id.unwrap_or(1),
        coin_id,
        quantity: payload.quantity.unwrap_or(1),
        condition: payload.condition.unwrap_or_else(|| "Good".to_string()),
        notes: payload.notes,
        paid_price: payload.paid_price,
    };

    let outcome = match collection_service::add_or_merge(&db, input).await {
        Ok(outcome) => outcome,
        Err(ServiceError::NotFound) => return error_response(ServiceError::NotFound, "Coin"),
        Err(e) => return error_response(e, "Collection item"),
    };

    let (status, row) = match outcome {
        AddOutcome::Created(row) => (StatusCode::CREATED, row),
        AddOutcome::Merged(row) => (StatusCode::OK, row),
    };

    match collection_service::enrich_items(&db, vec![row], true).await {
        Ok(mut items) => (status, Json(items.remove(0))).into_response(),
        Err(e) => error_response(e, "Collection item"),
    }
}

pub async fn update_collection_item(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCollectionRequest>,
) -> impl IntoResponse {
    let input = UpdateCollectionInput {
        quantity: payload.quantity,
        condition: payload.condition,
        notes: payload.notes,
        paid_price: payload.paid_price,
    };

    match collection_service::update_item(&db, id, input).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => error_response(e, "Collection item"),
    }
}

pub async fn delete_collection_item(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match collection_service::delete_item(&db, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e, "Collection item"),
    }
}

// Aggregated statistics for one user's ledger
pub async fn get_collection_stats(
    State(db): State<DatabaseConnection>,
    Path(user_id): Path<i32>,
) -> impl IntoResponse {
    match stats_service::collection_stats(&db, user_id).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response(e, "Collection item"),
    }
}
