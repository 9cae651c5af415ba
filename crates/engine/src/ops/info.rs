use std::collections::HashMap;

use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};

use crate::{
    AccountInfo, CoinHistory, EngineError, InventoryRow, ReceivedCoins, ResultEngine, SentCoins,
    accounts, purchases, transfers,
};

use super::Engine;

impl Engine {
    /// Current balance of an account.
    pub async fn balance(&self, account_id: i32) -> ResultEngine<i64> {
        Ok(self.account(account_id).await?.balance)
    }

    /// Purchased quantities grouped by item name, ordered by name.
    pub async fn inventory(&self, account_id: i32) -> ResultEngine<Vec<InventoryRow>> {
        let rows = purchases::Entity::find()
            .select_only()
            .column(purchases::Column::ItemName)
            .column_as(Expr::col(purchases::Column::Quantity).sum(), "quantity")
            .filter(purchases::Column::AccountId.eq(account_id))
            .group_by(purchases::Column::ItemName)
            .order_by_asc(purchases::Column::ItemName)
            .into_model::<InventoryRow>()
            .all(&self.database)
            .await?;
        Ok(rows)
    }

    /// Transfers sent by an account, newest first.
    pub async fn sent_transfers(&self, account_id: i32) -> ResultEngine<Vec<SentCoins>> {
        let models = transfers::Entity::find()
            .filter(transfers::Column::SenderId.eq(account_id))
            .order_by_desc(transfers::Column::CreatedAt)
            .order_by_desc(transfers::Column::Id)
            .all(&self.database)
            .await?;
        let names = self
            .usernames(models.iter().map(|transfer| transfer.receiver_id))
            .await?;

        models
            .into_iter()
            .map(|transfer| {
                Ok(SentCoins {
                    to_user: counterparty(&names, transfer.receiver_id)?,
                    amount: transfer.amount,
                    at: transfer.created_at,
                })
            })
            .collect()
    }

    /// Transfers received by an account, newest first.
    pub async fn received_transfers(&self, account_id: i32) -> ResultEngine<Vec<ReceivedCoins>> {
        let models = transfers::Entity::find()
            .filter(transfers::Column::ReceiverId.eq(account_id))
            .order_by_desc(transfers::Column::CreatedAt)
            .order_by_desc(transfers::Column::Id)
            .all(&self.database)
            .await?;
        let names = self
            .usernames(models.iter().map(|transfer| transfer.sender_id))
            .await?;

        models
            .into_iter()
            .map(|transfer| {
                Ok(ReceivedCoins {
                    from_user: counterparty(&names, transfer.sender_id)?,
                    amount: transfer.amount,
                    at: transfer.created_at,
                })
            })
            .collect()
    }

    /// Balance, inventory and coin history of an account.
    pub async fn info(&self, account_id: i32) -> ResultEngine<AccountInfo> {
        let balance = self.balance(account_id).await?;
        let inventory = self.inventory(account_id).await?;
        let received = self.received_transfers(account_id).await?;
        let sent = self.sent_transfers(account_id).await?;

        Ok(AccountInfo {
            balance,
            inventory,
            history: CoinHistory { received, sent },
        })
    }

    async fn usernames(
        &self,
        ids: impl Iterator<Item = i32>,
    ) -> ResultEngine<HashMap<i32, String>> {
        let mut ids: Vec<i32> = ids.collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids))
            .all(&self.database)
            .await?;
        Ok(models
            .into_iter()
            .map(|account| (account.id, account.username))
            .collect())
    }
}

fn counterparty(names: &HashMap<i32, String>, account_id: i32) -> ResultEngine<String> {
    names
        .get(&account_id)
        .cloned()
        .ok_or_else(|| EngineError::AccountNotFound(account_id.to_string()))
}
