//! Catalog of purchasable items, keyed by name.

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MerchandiseItem {
    pub name: String,
    /// Unit price in coins, always positive.
    pub price: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "merchandise")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub price: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MerchandiseItem {
    fn from(model: Model) -> Self {
        Self {
            name: model.name,
            price: model.price,
        }
    }
}
