//! Collection statistics.
//!
//! Grouped aggregates over the ledger. Absent sums come back as zero,
//! never null.

use sea_orm::*;
use serde::Serialize;

use crate::models::user_collection::{self, Entity as UserCollection};
use crate::services::ServiceError;

/// Rows and total quantity held for one coin variety.
#[derive(Debug, Serialize, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct CoinBucket {
    pub coin_id: i32,
    pub count: i64,
    pub total_quantity: i64,
}

/// Rows and total quantity held in one condition grade.
#[derive(Debug, Serialize, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct ConditionBucket {
    pub condition: String,
    pub count: i64,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total_items: u64,
    pub total_coins: i64,
    pub total_value: f64,
    pub unique_coins: usize,
    pub coin_breakdown: Vec<CoinBucket>,
    pub condition_breakdown: Vec<ConditionBucket>,
}

/// Compute the per-user summary statistics. The independent aggregates are
/// issued concurrently and awaited jointly.
pub async fn collection_stats(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<CollectionStats, ServiceError> {
    let total_items = UserCollection::find()
        .filter(user_collection::Column::UserId.eq(user_id))
        .count(db);

    let total_coins = UserCollection::find()
        .select_only()
        .column_as(user_collection::Column::Quantity.sum(), "total")
        .filter(user_collection::Column::UserId.eq(user_id))
        .into_tuple::<Option<i64>>()
        .one(db);

    // NULL paid prices stay out of the sum
    let total_value = UserCollection::find()
        .select_only()
        .column_as(user_collection::Column::PaidPrice.sum(), "total")
        .filter(user_collection::Column::UserId.eq(user_id))
        .filter(user_collection::Column::PaidPrice.is_not_null())
        .into_tuple::<Option<f64>>()
        .one(db);

    let coin_breakdown = UserCollection::find()
        .select_only()
        .column(user_collection::Column::CoinId)
        .column_as(user_collection::Column::Id.count(), "count")
        .column_as(user_collection::Column::Quantity.sum(), "total_quantity")
        .filter(user_collection::Column::UserId.eq(user_id))
        .group_by(user_collection::Column::CoinId)
        .into_model::<CoinBucket>()
        .all(db);

    let condition_breakdown = UserCollection::find()
        .select_only()
        .column(user_collection::Column::Condition)
        .column_as(user_collection::Column::Id.count(), "count")
        .column_as(user_collection::Column::Quantity.sum(), "total_quantity")
        .filter(user_collection::Column::UserId.eq(user_id))
        .group_by(user_collection::Column::Condition)
        .into_model::<ConditionBucket>()
        .all(db);

    let (total_items, total_coins, total_value, coin_breakdown, condition_breakdown) = futures::try_join!(
        total_items,
        total_coins,
        total_value,
        coin_breakdown,
        condition_breakdown,
    )?;

    Ok(CollectionStats {
        total_items,
        total_coins: total_coins.flatten().unwrap_or(0),
        total_value: total_value.flatten().unwrap_or(0.0),
        unique_coins: coin_breakdown.len(),
        coin_breakdown,
        condition_breakdown,
    })
}
