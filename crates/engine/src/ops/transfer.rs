use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseTransaction};

use crate::{EngineError, ResultEngine, Transfer, balance, transfers};

use super::{Engine, with_tx};

impl Engine {
    /// Move `amount` coins from `sender_id` to `receiver_id`.
    ///
    /// Sender debit, receiver credit and the transfer row form one unit of
    /// work: a failure at any step leaves both balances untouched.
    pub async fn transfer(
        &self,
        sender_id: i32,
        receiver_id: i32,
        amount: i64,
    ) -> ResultEngine<Transfer> {
        if sender_id == receiver_id {
            return Err(EngineError::SelfTransfer);
        }
        require_positive_amount(amount)?;

        let transfer = self
            .run_unit_of_work("transfer", move || {
                self.transfer_once(sender_id, receiver_id, amount)
            })
            .await?;

        tracing::info!(sender_id, receiver_id, amount, "transfer committed");
        Ok(transfer)
    }

    /// Same as [`Engine::transfer`], with the receiver given by username.
    ///
    /// The amount is checked before the receiver is looked up.
    pub async fn transfer_to_username(
        &self,
        sender_id: i32,
        receiver: &str,
        amount: i64,
    ) -> ResultEngine<Transfer> {
        require_positive_amount(amount)?;
        let receiver = self.account_by_username(receiver).await?;
        self.transfer(sender_id, receiver.id, amount).await
    }

    async fn transfer_once(
        &self,
        sender_id: i32,
        receiver_id: i32,
        amount: i64,
    ) -> ResultEngine<Transfer> {
        with_tx!(self, |db_tx| {
            self.transfer_in_tx(&db_tx, sender_id, receiver_id, amount)
                .await
        })
    }

    async fn transfer_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        sender_id: i32,
        receiver_id: i32,
        amount: i64,
    ) -> ResultEngine<Transfer> {
        if !balance::account_exists(db_tx, receiver_id).await? {
            return Err(EngineError::AccountNotFound(receiver_id.to_string()));
        }

        balance::debit(db_tx, sender_id, amount).await?;
        balance::credit(db_tx, receiver_id, amount).await?;

        let record = transfers::ActiveModel::new_record(sender_id, receiver_id, amount, Utc::now())
            .insert(db_tx)
            .await?;
        Ok(record.into())
    }
}

fn require_positive_amount(amount: i64) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be > 0, got {amount}"
        )));
    }
    Ok(())
}
