use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::error_response;
use crate::models::coin::{self, CoinDto, Entity as Coin};
use crate::models::coin_type::{self, Entity as CoinType};
use crate::models::mint::{self, Entity as Mint};
use crate::services::ServiceError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintDto {
    pub id: i32,
    pub name: String,
    pub mint_mark: String,
    pub location: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub coin_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListMintsQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMintRequest {
    pub name: Option<String>,
    pub mint_mark: Option<String>,
    pub location: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMintRequest {
    pub name: Option<String>,
    pub mint_mark: Option<String>,
    pub location: Option<String>,
    pub active: Option<bool>,
}

// List mints alphabetically with their coin counts
pub async fn list_mints(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListMintsQuery>,
) -> impl IntoResponse {
    let mut query = Mint::find().order_by_asc(mint::Column::Name);

    if let Some(active) = params.active {
        query = query.filter(mint::Column::Active.eq(active));
    }

    let mints = match query.all(&db).await {
        Ok(mints) => mints,
        Err(e) => return error_response(ServiceError::from(e), "Mint"),
    };

    let counts: Vec<(i32, i64)> = match Coin::find()
        .select_only()
        .column(coin::Column::MintId)
        .column_as(coin::Column::Id.count(), "count")
        .group_by(coin::Column::MintId)
        .into_tuple()
        .all(&db)
        .await
    {
        Ok(counts) => counts,
        Err(e) => return error_response(ServiceError::from(e), "Mint"),
    };
    let count_map: HashMap<i32, i64> = counts.into_iter().collect();

    let dtos: Vec<MintDto> = mints
        .into_iter()
        .map(|m| MintDto {
            coin_count: count_map.get(&m.id).copied().unwrap_or(0),
            id: m.id,
            name: m.name,
            mint_mark: m.mint_mark,
            location: m.location,
            active: m.active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
        .collect();

    (StatusCode::OK, Json(dtos)).into_response()
}

// Get a mint with its coins (types nested), year desc then type name asc
pub async fn get_mint(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let mint = match Mint::find_by_id(id).one(&db).await {
        Ok(Some(m)) => m,
        Ok(None) => return error_response(ServiceError::NotFound, "Mint"),
        Err(e) => return error_response(ServiceError::from(e), "Mint"),
    };

    let coins = match Coin::find()
        .filter(coin::Column::MintId.eq(mint.id))
        .find_also_related(CoinType)
        .order_by_desc(coin::Column::Year)
        .order_by_asc(coin_type::Column::Name)
        .all(&db)
        .await
    {
        Ok(coins) => coins,
        Err(e) => return error_response(ServiceError::from(e), "Mint"),
    };

    let coin_dtos: Vec<CoinDto> = coins
        .into_iter()
        .map(|(c, t)| CoinDto::with_relations(c, t, None))
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "id": mint.id,
            "name": mint.name,
            "mintMark": mint.mint_mark,
            "location": mint.location,
            "active": mint.active,
            "createdAt": mint.created_at,
            "updatedAt": mint.updated_at,
            "coinCount": coin_dtos.len(),
            "coins": coin_dtos,
        })),
    )
        .into_response()
}

pub async fn create_mint(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CreateMintRequest>,
) -> impl IntoResponse {
    let (name, mint_mark) = match (
        payload.name.filter(|n| !n.trim().is_empty()),
        payload.mint_mark,
    ) {
        (Some(name), Some(mint_mark)) => (name, mint_mark),
        _ => {
            return error_response(
                ServiceError::Validation(
                    "Missing required fields: name, mintMark".to_string(),
                ),
                "Mint",
            )
        }
    };

    let now = chrono::Utc::now().to_rfc3339();
    let new_mint = mint::ActiveModel {
        name: Set(name),
        mint_mark: Set(mint_mark),
        location: Set(payload.location),
        active: Set(payload.active.unwrap_or(true)),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_mint.insert(&db).await {
        Ok(model) => (StatusCode::CREATED, Json(model)).into_response(),
        Err(e) => match ServiceError::from(e) {
            ServiceError::Conflict(_) => error_response(
                ServiceError::Conflict(
                    "Mint with this name or mint mark already exists".to_string(),
                ),
                "Mint",
            ),
            other => error_response(other, "Mint"),
        },
    }
}

pub async fn update_mint(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateMintRequest>,
) -> impl IntoResponse {
    let mint = match Mint::find_by_id(id).one(&db).await {
        Ok(Some(m)) => m,
        Ok(None) => return error_response(ServiceError::NotFound, "Mint"),
        Err(e) => return error_response(ServiceError::from(e), "Mint"),
    };

    let mut active_model: mint::ActiveModel = mint.into();
    if let Some(name) = payload.name {
        active_model.name = Set(name);
    }
    if let Some(mint_mark) = payload.mint_mark {
        active_model.mint_mark = Set(mint_mark);
    }
    if let Some(location) = payload.location {
        active_model.location = Set(Some(location));
    }
    if let Some(active) = payload.active {
        active_model.active = Set(active);
    }
    active_model.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match active_model.update(&db).await {
        Ok(model) => (StatusCode::OK, Json(model)).into_response(),
        Err(e) => match ServiceError::from(e) {
            ServiceError::Conflict(_) => error_response(
                ServiceError::Conflict(
                    "Mint with this name or mint mark already exists".to_string(),
                ),
                "Mint",
            ),
            other => error_response(other, "Mint"),
        },
    }
}

// Delete a mint, rejected while coins still reference it
pub async fn delete_mint(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let mint = match Mint::find_by_id(id).one(&db).await {
        Ok(Some(m)) => m,
        Ok(None) => return error_response(ServiceError::NotFound, "Mint"),
        Err(e) => return error_response(ServiceError::from(e), "Mint"),
    };

    let coin_count = match Coin::find()
        .filter(coin::Column::MintId.eq(mint.id))
        .count(&db)
        .await
    {
        Ok(count) => count,
        Err(e) => return error_response(ServiceError::from(e), "Mint"),
    };

    if coin_count > 0 {
        return error_response(
            ServiceError::Validation(
                "Cannot delete mint that has associated coins".to_string(),
            ),
            "Mint",
        );
    }

    match mint.delete(&db).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(ServiceError::from(e), "Mint"),
    }
}
