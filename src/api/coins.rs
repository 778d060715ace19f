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

use crate::api::{error_response, normalize_paging, Pagination};
use crate::models::coin::{self, CoinDto, Entity as Coin};
use crate::models::coin_type::{self, Entity as CoinType};
use crate::models::mint::{self, Entity as Mint};
use crate::models::user::{self, Entity as User, UserSummary};
use crate::models::user_collection::{self, CollectionItemDto, Entity as UserCollection};
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCoinsQuery {
    pub year: Option<i32>,
    pub type_id: Option<i32>,
    pub mint_id: Option<i32>,
    pub condition: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCoinRequest {
    pub year: Option<i32>,
    pub type_id: Option<i32>,
    pub mint_id: Option<i32>,
    pub condition: Option<String>,
    pub value: Option<f64>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

/// Identity fields (year, mint, type) are immutable after creation and
/// deliberately absent here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoinRequest {
    pub condition: Option<String>,
    pub value: Option<f64>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CoinDetail {
    #[serde(flatten)]
    coin: CoinDto,
    collections: Vec<CollectionItemDto>,
}

// Paginated catalog list: year desc, then type name, then mint mark
pub async fn list_coins(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListCoinsQuery>,
) -> impl IntoResponse {
    let (page, limit) = normalize_paging(params.page, params.limit);

    let mut condition = Condition::all();
    if let Some(year) = params.year {
        condition = condition.add(coin::Column::Year.eq(year));
    }
    if let Some(type_id) = params.type_id {
        condition = condition.add(coin::Column::TypeId.eq(type_id));
    }
    if let Some(mint_id) = params.mint_id {
        condition = condition.add(coin::Column::MintId.eq(mint_id));
    }
    if let Some(cond) = params.condition {
        condition = condition.add(coin::Column::Condition.eq(cond));
    }

    let count_query = Coin::find().filter(condition.clone()).count(&db);
    let page_query = Coin::find()
        .join(JoinType::LeftJoin, coin::Relation::Type.def())
        .join(JoinType::LeftJoin, coin::Relation::Mint.def())
        .filter(condition)
        .order_by_desc(coin::Column::Year)
        .order_by_asc(coin_type::Column::Name)
        .order_by_asc(mint::Column::MintMark)
        .offset((page - 1) * limit)
        .limit(limit)
        .all(&db);

    let (total, coins) = match futures::try_join!(count_query, page_query) {
        Ok(res) => res,
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };

    let dtos = match enrich_coins(&db, coins).await {
        Ok(dtos) => dtos,
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };

    (
        StatusCode::OK,
        Json(json!({
            "data": dtos,
            "pagination": Pagination::new(page, limit, total),
        })),
    )
        .into_response()
}

// Get a coin with its dimensions and the collection rows that own it
pub async fn get_coin(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let coin_model = match Coin::find_by_id(id).one(&db).await {
        Ok(Some(c)) => c,
        Ok(None) => return error_response(ServiceError::NotFound, "Coin"),
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };

    let mut dtos = match enrich_coins(&db, vec![coin_model]).await {
        Ok(dtos) => dtos,
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };
    let dto = dtos.remove(0);

    // Ledger rows owning this coin, with user summaries
    let rows = match UserCollection::find()
        .filter(user_collection::Column::CoinId.eq(id))
        .order_by_desc(user_collection::Column::CreatedAt)
        .all(&db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };

    let user_ids: Vec<i32> = rows.iter().map(|r| r.user_id).collect();
    let user_map: HashMap<i32, UserSummary> = match User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(&db)
        .await
    {
        Ok(users) => users
            .into_iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect(),
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };

    let collections: Vec<CollectionItemDto> = rows
        .into_iter()
        .map(|row| {
            let mut item = CollectionItemDto::from(row);
            item.user = user_map.get(&item.user_id).cloned();
            item
        })
        .collect();

    (
        StatusCode::OK,
        Json(CoinDetail {
            coin: dto,
            collections,
        }),
    )
        .into_response()
}

pub async fn create_coin(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CreateCoinRequest>,
) -> impl IntoResponse {
    let (year, type_id, mint_id) = match (payload.year, payload.type_id, payload.mint_id) {
        (Some(year), Some(type_id), Some(mint_id)) => (year, type_id, mint_id),
        _ => {
            return error_response(
                ServiceError::Validation(
                    "Missing required fields: year, typeId, mintId".to_string(),
                ),
                "Coin",
            )
        }
    };

    // Both dimension records must exist
    let mint_model = match Mint::find_by_id(mint_id).one(&db).await {
        Ok(Some(m)) => m,
        Ok(None) => return error_response(ServiceError::NotFound, "Mint"),
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };
    let type_model = match CoinType::find_by_id(type_id).one(&db).await {
        Ok(Some(t)) => t,
        Ok(None) => return error_response(ServiceError::NotFound, "Coin type"),
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };

    let now = chrono::Utc::now().to_rfc3339();
    let new_coin = coin::ActiveModel {
        year: Set(year),
        mint_id: Set(mint_id),
        type_id: Set(type_id),
        condition: Set(payload.condition),
        value: Set(payload.value),
        notes: Set(payload.notes),
        image_url: Set(payload.image_url),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_coin.insert(&db).await {
        Ok(model) => (
            StatusCode::CREATED,
            Json(CoinDto::with_relations(
                model,
                Some(type_model),
                Some(mint_model),
            )),
        )
            .into_response(),
        Err(e) => match ServiceError::from(e) {
            ServiceError::Conflict(_) => error_response(
                ServiceError::Conflict(
                    "Coin with this year, mint, and type already exists".to_string(),
                ),
                "Coin",
            ),
            other => error_response(other, "Coin"),
        },
    }
}

pub async fn update_coin(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCoinRequest>,
) -> impl IntoResponse {
    let coin_model = match Coin::find_by_id(id).one(&db).await {
        Ok(Some(c)) => c,
        Ok(None) => return error_response(ServiceError::NotFound, "Coin"),
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };

    let mut active: coin::ActiveModel = coin_model.into();
    active.condition = Set(payload.condition);
    active.value = Set(payload.value);
    active.notes = Set(payload.notes);
    active.image_url = Set(payload.image_url);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    let updated = match active.update(&db).await {
        Ok(model) => model,
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };

    match enrich_coins(&db, vec![updated]).await {
        Ok(mut dtos) => (StatusCode::OK, Json(dtos.remove(0))).into_response(),
        Err(e) => error_response(ServiceError::from(e), "Coin"),
    }
}

pub async fn delete_coin(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let coin_model = match Coin::find_by_id(id).one(&db).await {
        Ok(Some(c)) => c,
        Ok(None) => return error_response(ServiceError::NotFound, "Coin"),
        Err(e) => return error_response(ServiceError::from(e), "Coin"),
    };

    match coin_model.delete(&db).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(ServiceError::from(e), "Coin"),
    }
}

/// Attach the type and mint records to each coin, batching the lookups.
async fn enrich_coins(
    db: &DatabaseConnection,
    coins: Vec<coin::Model>,
) -> Result<Vec<CoinDto>, DbErr> {
    if coins.is_empty() {
        return Ok(Vec::new());
    }

    let type_ids: Vec<i32> = coins.iter().map(|c| c.type_id).collect();
    let mint_ids: Vec<i32> = coins.iter().map(|c| c.mint_id).collect();

    let (types, mints) = futures::try_join!(
        CoinType::find()
            .filter(coin_type::Column::Id.is_in(type_ids))
            .all(db),
        Mint::find().filter(mint::Column::Id.is_in(mint_ids)).all(db),
    )?;

    let type_map: HashMap<i32, coin_type::Model> =
        types.into_iter().map(|t| (t.id, t)).collect();
    let mint_map: HashMap<i32, mint::Model> = mints.into_iter().map(|m| (m.id, m)).collect();

    Ok(coins
        .into_iter()
        .map(|c| {
            let coin_type = type_map.get(&c.type_id).cloned();
            let mint = mint_map.get(&c.mint_id).cloned();
            CoinDto::with_relations(c, coin_type, mint)
        })
        .collect())
}
