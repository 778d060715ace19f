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
pub struct CoinTypeDto {
    pub id: i32,
    pub name: String,
    pub denomination: String,
    pub series: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub coin_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListTypesQuery {
    pub denomination: Option<String>,
    pub series: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTypeRequest {
    pub name: Option<String>,
    pub denomination: Option<String>,
    pub series: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTypeRequest {
    pub name: Option<String>,
    pub denomination: Option<String>,
    pub series: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub description: Option<String>,
}

// List coin types alphabetically with their coin counts
pub async fn list_types(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListTypesQuery>,
) -> impl IntoResponse {
    let mut query = CoinType::find().order_by_asc(coin_type::Column::Name);

    if let Some(denomination) = params.denomination {
        query = query.filter(coin_type::Column::Denomination.eq(denomination));
    }
    if let Some(series) = params.series {
        query = query.filter(coin_type::Column::Series.eq(series));
    }

    let types = match query.all(&db).await {
        Ok(types) => types,
        Err(e) => return error_response(ServiceError::from(e), "Coin type"),
    };

    let counts: Vec<(i32, i64)> = match Coin::find()
        .select_only()
        .column(coin::Column::TypeId)
        .column_as(coin::Column::Id.count(), "count")
        .group_by(coin::Column::TypeId)
        .into_tuple()
        .all(&db)
        .await
    {
        Ok(counts) => counts,
        Err(e) => return error_response(ServiceError::from(e), "Coin type"),
    };
    let count_map: HashMap<i32, i64> = counts.into_iter().collect();

    let dtos: Vec<CoinTypeDto> = types
        .into_iter()
        .map(|t| CoinTypeDto {
            coin_count: count_map.get(&t.id).copied().unwrap_or(0),
            id: t.id,
            name: t.name,
            denomination: t.denomination,
            series: t.series,
            start_year: t.start_year,
            end_year: t.end_year,
            description: t.description,
            created_at: t.created_at,
            updated_at: t.updated_at,
        })
        .collect();

    (StatusCode::OK, Json(dtos)).into_response()
}

// Get a coin type with its coins (mints nested), year desc then mint mark asc
pub async fn get_type(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let coin_type = match CoinType::find_by_id(id).one(&db).await {
        Ok(Some(t)) => t,
        Ok(None) => return error_response(ServiceError::NotFound, "Coin type"),
        Err(e) => return error_response(ServiceError::from(e), "Coin type"),
    };

    let coins = match Coin::find()
        .filter(coin::Column::TypeId.eq(coin_type.id))
        .find_also_related(Mint)
        .order_by_desc(coin::Column::Year)
        .order_by_asc(mint::Column::MintMark)
        .all(&db)
        .await
    {
        Ok(coins) => coins,
        Err(e) => return error_response(ServiceError::from(e), "Coin type"),
    };

    let coin_dtos: Vec<CoinDto> = coins
        .into_iter()
        .map(|(c, m)| CoinDto::with_relations(c, None, m))
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "id": coin_type.id,
            "name": coin_type.name,
            "denomination": coin_type.denomination,
            "series": coin_type.series,
            "startYear": coin_type.start_year,
            "endYear": coin_type.end_year,
            "description": coin_type.description,
            "createdAt": coin_type.created_at,
            "updatedAt": coin_type.updated_at,
            "coinCount": coin_dtos.len(),
            "coins": coin_dtos,
        })),
    )
        .into_response()
}

pub async fn create_type(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CreateTypeRequest>,
) -> impl IntoResponse {
    let (name, denomination) = match (
        payload.name.filter(|n| !n.trim().is_empty()),
        payload.denomination.filter(|d| !d.trim().is_empty()),
    ) {
        (Some(name), Some(denomination)) => (name, denomination),
        _ => {
            return error_response(
                ServiceError::Validation(
                    "Missing required fields: name, denomination".to_string(),
                ),
                "Coin type",
            )
        }
    };

    let now = chrono::Utc::now().to_rfc3339();
    let new_type = coin_type::ActiveModel {
        name: Set(name),
        denomination: Set(denomination),
        series: Set(payload.series),
        start_year: Set(payload.start_year),
        end_year: Set(payload.end_year),
        description: Set(payload.description),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_type.insert(&db).await {
        Ok(model) => (StatusCode::CREATED, Json(model)).into_response(),
        Err(e) => match ServiceError::from(e) {
            ServiceError::Conflict(_) => error_response(
                ServiceError::Conflict("Coin type with this name already exists".to_string()),
                "Coin type",
            ),
            other => error_response(other, "Coin type"),
        },
    }
}

pub async fn update_type(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTypeRequest>,
) -> impl IntoResponse {
    let coin_type = match CoinType::find_by_id(id).one(&db).await {
        Ok(Some(t)) => t,
        Ok(None) => return error_response(ServiceError::NotFound, "Coin type"),
        Err(e) => return error_response(ServiceError::from(e), "Coin type"),
    };

    let mut active: coin_type::ActiveModel = coin_type.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(denomination) = payload.denomination {
        active.denomination = Set(denomination);
    }
    if let Some(series) = payload.series {
        active.series = Set(Some(series));
    }
    if let Some(start_year) = payload.start_year {
        active.start_year = Set(Some(start_year));
    }
    if let Some(end_year) = payload.end_year {
        active.end_year = Set(Some(end_year));
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match active.update(&db).await {
        Ok(model) => (StatusCode::OK, Json(model)).into_response(),
        Err(e) => match ServiceError::from(e) {
            ServiceError::Conflict(_) => error_response(
                ServiceError::Conflict("Coin type with this name already exists".to_string()),
                "Coin type",
            ),
            other => error_response(other, "Coin type"),
        },
    }
}

// Delete a coin type, rejected while coins still reference it
pub async fn delete_type(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let coin_type = match CoinType::find_by_id(id).one(&db).await {
        Ok(Some(t)) => t,
        Ok(None) => return error_response(ServiceError::NotFound, "Coin type"),
        Err(e) => return error_response(ServiceError::from(e), "Coin type"),
    };

    let coin_count = match Coin::find()
        .filter(coin::Column::TypeId.eq(coin_type.id))
        .count(&db)
        .await
    {
        Ok(count) => count,
        Err(e) => return error_response(ServiceError::from(e), "Coin type"),
    };

    if coin_count > 0 {
        return error_response(
            ServiceError::Validation(
                "Cannot delete coin type that has associated coins".to_string(),
            ),
            "Coin type",
        );
    }

    match coin_type.delete(&db).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(ServiceError::from(e), "Coin type"),
    }
}
