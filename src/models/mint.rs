use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mints")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Letter(s) struck on the coin identifying the facility, e.g. "D" for Denver.
    pub mint_mark: String,
    pub location: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::coin::Entity")]
    Coins,
}

impl Related<super::coin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coins.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
