//! Read-side views of an account.

use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::Serialize;

/// Owned quantity of one item, summed over every purchase of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct InventoryRow {
    pub item_name: String,
    pub quantity: i64,
}

/// A transfer seen from the receiver's side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReceivedCoins {
    pub from_user: String,
    pub amount: i64,
    pub at: DateTime<Utc>,
}

/// A transfer seen from the sender's side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SentCoins {
    pub to_user: String,
    pub amount: i64,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoinHistory {
    pub received: Vec<ReceivedCoins>,
    pub sent: Vec<SentCoins>,
}

/// Balance, inventory and coin history of one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub balance: i64,
    pub inventory: Vec<InventoryRow>,
    pub history: CoinHistory,
}
