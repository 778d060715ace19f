//! Collection ledger operations.

use std::collections::HashMap;

use sea_orm::*;

use crate::models::coin::{self, CoinDto, Entity as Coin};
use crate::models::coin_type::{self, Entity as CoinType};
use crate::models::mint::{self, Entity as Mint};
use crate::models::user::{self, Entity as User, UserSummary};
use crate::models::user_collection::{self, CollectionItemDto, Entity as UserCollection};
use crate::services::ServiceError;

/// Input for adding a coin to a user's collection.
#[derive(Debug, Clone)]
pub struct AddToCollectionInput {
    pub user_id: i32,
    pub coin_id: i32,
    pub quantity: i32,
    pub condition: String,
    pub notes: Option<String>,
    pub paid_price: Option<f64>,
}

/// Input for updating a ledger row by id.
#[derive(Debug, Default, Clone)]
pub struct UpdateCollectionInput {
    pub quantity: Option<i32>,
    pub condition: Option<String>,
    pub notes: Option<String>,
    pub paid_price: Option<f64>,
}

/// Outcome of an add: a fresh row (201) or a merge into an existing one (200).
#[derive(Debug)]
pub enum AddOutcome {
    Created(user_collection::Model),
    Merged(user_collection::Model),
}

/// Add a coin to a user's collection, merging with an existing
/// (user, coin, condition) row by incrementing its quantity.
///
/// Runs inside a single transaction so two concurrent adds of the same
/// tuple serialize instead of both inserting.
pub async fn add_or_merge(
    db: &DatabaseConnection,
    input: AddToCollectionInput,
) -> Result<AddOutcome, ServiceError> {
    if input.quantity < 1 {
        return Err(ServiceError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }

    // The coin must exist before we touch the ledger
    Coin::find_by_id(input.coin_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let now = chrono::Utc::now().to_rfc3339();
    let txn = db.begin().await?;

    let existing = UserCollection::find()
        .filter(user_collection::Column::UserId.eq(input.user_id))
        .filter(user_collection::Column::CoinId.eq(input.coin_id))
        .filter(user_collection::Column::Condition.eq(input.condition.clone()))
        .one(&txn)
        .await?;

    let outcome = match existing {
        Some(row) => {
            let quantity = row.quantity + input.quantity;
            let notes = input.notes.or(row.notes.clone());
            let paid_price = input.paid_price.or(row.paid_price);

            let mut active: user_collection::ActiveModel = row.into();
            active.quantity = Set(quantity);
            active.notes = Set(notes);
            active.paid_price = Set(paid_price);
            active.updated_at = Set(now);

            AddOutcome::Merged(active.update(&txn).await?)
        }
        None => {
            let new_row = user_collection::ActiveModel {
                user_id: Set(input.user_id),
                coin_id: Set(input.coin_id),
                quantity: Set(input.quantity),
                condition: Set(input.condition),
                notes: Set(input.notes),
                paid_price: Set(input.paid_price),
                created_at: Set(now.clone()),
                updated_at: Set(now),
                ..Default::default()
            };

            AddOutcome::Created(new_row.insert(&txn).await?)
        }
    };

    txn.commit().await?;

    Ok(outcome)
}

/// List a user's ledger rows, newest first, with the total row count.
/// Count and page are fetched jointly.
pub async fn list_items(
    db: &DatabaseConnection,
    user_id: i32,
    page: u64,
    limit: u64,
) -> Result<(Vec<CollectionItemDto>, u64), ServiceError> {
    let query = UserCollection::find()
        .filter(user_collection::Column::UserId.eq(user_id))
        .order_by_desc(user_collection::Column::CreatedAt)
        .order_by_desc(user_collection::Column::Id);

    let (total, rows) = futures::try_join!(
        query.clone().count(db),
        query.clone().offset((page - 1) * limit).limit(limit).all(db),
    )?;

    let items = enrich_items(db, rows, true).await?;

    Ok((items, total))
}

/// Fetch a single ledger row by id with coin and user nested.
pub async fn get_item(
    db: &DatabaseConnection,
    id: i32,
) -> Result<CollectionItemDto, ServiceError> {
    let row = UserCollection::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let mut items = enrich_items(db, vec![row], true).await?;
    Ok(items.remove(0))
}

/// Overwrite the mutable fields of a ledger row.
pub async fn update_item(
    db: &DatabaseConnection,
    id: i32,
    input: UpdateCollectionInput,
) -> Result<CollectionItemDto, ServiceError> {
    if let Some(quantity) = input.quantity {
        if quantity < 1 {
            return Err(ServiceError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
    }

    let row = UserCollection::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let mut active: user_collection::ActiveModel = row.into();
    if let Some(quantity) = input.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(condition) = input.condition {
        active.condition = Set(condition);
    }
    active.notes = Set(input.notes);
    active.paid_price = Set(input.paid_price);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    let updated = active.update(db).await?;

    let mut items = enrich_items(db, vec![updated], true).await?;
    Ok(items.remove(0))
}

/// Remove a ledger row by id.
pub async fn delete_item(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let row = UserCollection::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    row.delete(db).await?;

    Ok(())
}

/// All ledger rows of one user, newest first, coin nested (no user echo).
pub async fn items_for_user(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<CollectionItemDto>, ServiceError> {
    let rows = UserCollection::find()
        .filter(user_collection::Column::UserId.eq(user_id))
        .order_by_desc(user_collection::Column::CreatedAt)
        .order_by_desc(user_collection::Column::Id)
        .all(db)
        .await?;

    enrich_items(db, rows, false).await
}

/// Attach the referenced coin (with its type and mint) and optionally the
/// owning user to each ledger row, batching the lookups.
pub(crate) async fn enrich_items(
    db: &DatabaseConnection,
    rows: Vec<user_collection::Model>,
    include_user: bool,
) -> Result<Vec<CollectionItemDto>, ServiceError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let coin_ids: Vec<i32> = rows.iter().map(|r| r.coin_id).collect();
    let coins = Coin::find()
        .filter(coin::Column::Id.is_in(coin_ids))
        .all(db)
        .await?;

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

    let coin_map: HashMap<i32, CoinDto> = coins
        .into_iter()
        .map(|c| {
            let coin_type = type_map.get(&c.type_id).cloned();
            let mint = mint_map.get(&c.mint_id).cloned();
            (c.id, CoinDto::with_relations(c, coin_type, mint))
        })
        .collect();

    let user_map: HashMap<i32, UserSummary> = if include_user {
        let user_ids: Vec<i32> = rows.iter().map(|r| r.user_id).collect();
        User::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect()
    } else {
        HashMap::new()
    };

    let items = rows
        .into_iter()
        .map(|row| {
            let mut item = CollectionItemDto::from(row);
            item.coin = coin_map.get(&item.coin_id).cloned();
            if include_user {
                item.user = user_map.get(&item.user_id).cloned();
            }
            item
        })
        .collect();

    Ok(items)
}
