use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A coin variety. Identity is the (year, mint, type) triple; the remaining
/// fields are catalogue data that may change after creation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coins")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub year: i32,
    pub mint_id: i32,
    pub type_id: i32,
    pub condition: Option<String>,
    pub value: Option<f64>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mint::Entity",
        from = "Column::MintId",
        to = "super::mint::Column::Id"
    )]
    Mint,
    #[sea_orm(
        belongs_to = "super::coin_type::Entity",
        from = "Column::TypeId",
        to = "super::coin_type::Column::Id"
    )]
    Type,
    #[sea_orm(has_many = "super::user_collection::Entity")]
    Collections,
}

impl Related<super::mint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mint.def()
    }
}

impl Related<super::coin_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Type.def()
    }
}

impl Related<super::user_collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for API responses, with the dimension records nested
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinDto {
    pub id: i32,
    pub year: i32,
    pub mint_id: i32,
    pub type_id: i32,
    pub condition: Option<String>,
    pub value: Option<f64>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<super::coin_type::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint: Option<super::mint::Model>,
}

impl From<Model> for CoinDto {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            year: model.year,
            mint_id: model.mint_id,
            type_id: model.type_id,
            condition: model.condition,
            value: model.value,
            notes: model.notes,
            image_url: model.image_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
            r#type: None,
            mint: None,
        }
    }
}

impl CoinDto {
    pub fn with_relations(
        model: Model,
        coin_type: Option<super::coin_type::Model>,
        mint: Option<super::mint::Model>,
    ) -> Self {
        let mut dto = Self::from(model);
        dto.r#type = coin_type;
        dto.mint = mint;
        dto
    }
}
