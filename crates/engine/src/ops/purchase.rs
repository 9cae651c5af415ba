use chrono::Utc;
use sea_orm::{DatabaseTransaction, prelude::*};

use crate::{EngineError, Purchase, ResultEngine, balance, merchandise, purchases};

use super::{Engine, with_tx};

impl Engine {
    /// Buy `quantity` units of `item_name` for `account_id`.
    ///
    /// The debit and the purchase row commit together or not at all. A
    /// concurrent conflict is retried under the engine's retry policy.
    pub async fn purchase(
        &self,
        account_id: i32,
        quantity: i32,
        item_name: &str,
    ) -> ResultEngine<Purchase> {
        if quantity <= 0 {
            return Err(EngineError::InvalidQuantity(format!(
                "quantity must be > 0, got {quantity}"
            )));
        }

        let purchase = self
            .run_unit_of_work("purchase", move || {
                self.purchase_once(account_id, quantity, item_name)
            })
            .await?;

        tracing::info!(
            account_id,
            item = %purchase.item_name,
            quantity,
            total_price = purchase.total_price,
            "purchase committed"
        );
        Ok(purchase)
    }

    async fn purchase_once(
        &self,
        account_id: i32,
        quantity: i32,
        item_name: &str,
    ) -> ResultEngine<Purchase> {
        with_tx!(self, |db_tx| {
            self.purchase_in_tx(&db_tx, account_id, quantity, item_name)
                .await
        })
    }

    async fn purchase_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: i32,
        quantity: i32,
        item_name: &str,
    ) -> ResultEngine<Purchase> {
        let item = merchandise::Entity::find_by_id(item_name.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::ItemNotFound(item_name.to_string()))?;

        let total_price = item.price.checked_mul(i64::from(quantity)).ok_or_else(|| {
            EngineError::InvalidQuantity(format!("{quantity} x {} overflows", item.name))
        })?;

        balance::debit(db_tx, account_id, total_price).await?;

        let record =
            purchases::ActiveModel::new_record(account_id, &item.name, quantity, total_price, Utc::now())
                .insert(db_tx)
                .await?;
        Ok(record.into())
    }
}
