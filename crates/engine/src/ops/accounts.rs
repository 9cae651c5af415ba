use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, SqlErr, prelude::*};

use crate::{
    Account, EngineError, MerchandiseItem, Purchase, ResultEngine, accounts, merchandise,
    purchases,
};

use super::{Engine, normalize_username};

impl Engine {
    /// Create a new account credited with the starting balance.
    ///
    /// `credential` is stored as given: hashing it is the caller's job.
    pub async fn register(&self, username: &str, credential: &str) -> ResultEngine<Account> {
        let username = normalize_username(username)?;

        let exists = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username.as_str()))
            .one(&self.database)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::ExistingAccount(username));
        }

        let model = accounts::ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(username.clone()),
            credential: ActiveValue::Set(credential.to_string()),
            balance: ActiveValue::Set(self.starting_balance),
            created_at: ActiveValue::Set(Utc::now()),
        };
        match model.insert(&self.database).await {
            Ok(model) => {
                tracing::info!(account_id = model.id, username = %model.username, "account registered");
                Ok(model.into())
            }
            // Lost a race with a concurrent registration of the same name.
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(EngineError::ExistingAccount(username))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn account(&self, account_id: i32) -> ResultEngine<Account> {
        accounts::Entity::find_by_id(account_id)
            .one(&self.database)
            .await?
            .map(Account::from)
            .ok_or_else(|| EngineError::AccountNotFound(account_id.to_string()))
    }

    pub async fn account_by_username(&self, username: &str) -> ResultEngine<Account> {
        let username = username.trim();
        accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.database)
            .await?
            .map(Account::from)
            .ok_or_else(|| EngineError::AccountNotFound(username.to_string()))
    }

    /// Return the stored credential of `username`, for the caller to verify.
    pub async fn credential(&self, username: &str) -> ResultEngine<(Account, String)> {
        let username = username.trim();
        let model = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::AccountNotFound(username.to_string()))?;
        let credential = model.credential.clone();
        Ok((model.into(), credential))
    }

    pub async fn merchandise(&self, name: &str) -> ResultEngine<MerchandiseItem> {
        merchandise::Entity::find_by_id(name.to_string())
            .one(&self.database)
            .await?
            .map(MerchandiseItem::from)
            .ok_or_else(|| EngineError::ItemNotFound(name.to_string()))
    }

    /// The whole catalog, ordered by item name.
    pub async fn catalog(&self) -> ResultEngine<Vec<MerchandiseItem>> {
        let models = merchandise::Entity::find()
            .order_by_asc(merchandise::Column::Name)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(MerchandiseItem::from).collect())
    }

    /// Purchases of an account, newest first.
    pub async fn purchases(&self, account_id: i32) -> ResultEngine<Vec<Purchase>> {
        let models = purchases::Entity::find()
            .filter(purchases::Column::AccountId.eq(account_id))
            .order_by_desc(purchases::Column::CreatedAt)
            .order_by_desc(purchases::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Purchase::from).collect())
    }
}
