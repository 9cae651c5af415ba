//! Purchase records.
//!
//! One row per successful purchase. Rows are append-only: the ledger never
//! updates or deletes them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Purchase {
    pub id: i32,
    pub account_id: i32,
    pub item_name: String,
    pub quantity: i32,
    /// Unit price times quantity, as charged.
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub item_name: String,
    pub quantity: i32,
    pub total_price: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new_record(
        account_id: i32,
        item_name: &str,
        quantity: i32,
        total_price: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            account_id: ActiveValue::Set(account_id),
            item_name: ActiveValue::Set(item_name.to_string()),
            quantity: ActiveValue::Set(quantity),
            total_price: ActiveValue::Set(total_price),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl From<Model> for Purchase {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            item_name: model.item_name,
            quantity: model.quantity,
            total_price: model.total_price,
            created_at: model.created_at,
        }
    }
}
