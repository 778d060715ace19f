use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger row recording that a user owns a coin in a given condition.
/// One row per (user, coin, condition); repeated adds merge into `quantity`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_collections")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub coin_id: i32,
    pub quantity: i32,
    pub condition: String,
    pub notes: Option<String>,
    pub paid_price: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::coin::Entity",
        from = "Column::CoinId",
        to = "super::coin::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Coin,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::coin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for API responses with the coin (and optionally the user) nested
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItemDto {
    pub id: i32,
    pub user_id: i32,
    pub coin_id: i32,
    pub quantity: i32,
    pub condition: String,
    pub notes: Option<String>,
    pub paid_price: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin: Option<super::coin::CoinDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<super::user::UserSummary>,
}

impl From<Model> for CollectionItemDto {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            coin_id: model.coin_id,
            quantity: model.quantity,
            condition: model.condition,
            notes: model.notes,
            paid_price: model.paid_price,
            created_at: model.created_at,
            updated_at: model.updated_at,
            coin: None,
            user: None,
        }
    }
}
