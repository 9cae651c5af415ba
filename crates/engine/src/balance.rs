//! Balance mutator.
//!
//! Every balance change goes through [`apply_delta`]: a single conditional
//! `UPDATE` whose predicate, for debits, requires the current balance to cover
//! the amount removed. The store evaluates the predicate against the row it
//! updates, so two concurrent debits can never both see the pre-debit balance.
//!
//! The mutator never opens a transaction itself. Callers pass the unit of
//! work they are running in, so the balance change commits or rolls back
//! together with the history row that explains it.

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*, sea_query::Expr};

use crate::{EngineError, ResultEngine, accounts};

/// Add `delta` to the balance of `account_id`.
///
/// Returns `true` when exactly one row was updated. `false` means the account
/// does not exist or, for a negative `delta`, its balance is lower than
/// `-delta`. Which of the two is left for the caller to decide.
pub async fn apply_delta<C>(conn: &C, account_id: i32, delta: i64) -> ResultEngine<bool>
where
    C: ConnectionTrait,
{
    let mut update = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Balance,
            Expr::col(accounts::Column::Balance).add(delta),
        )
        .filter(accounts::Column::Id.eq(account_id));

    if delta < 0 {
        let required = delta
            .checked_neg()
            .ok_or_else(|| EngineError::InvalidAmount(format!("{delta} is out of range")))?;
        update = update.filter(accounts::Column::Balance.gte(required));
    }

    let result = update.exec(conn).await?;
    Ok(result.rows_affected == 1)
}

/// Remove `amount` coins from `account_id`.
pub(crate) async fn debit<C>(conn: &C, account_id: i32, amount: i64) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    if apply_delta(conn, account_id, -amount).await? {
        return Ok(());
    }

    if account_exists(conn, account_id).await? {
        Err(EngineError::InsufficientFunds(format!(
            "account {account_id} cannot cover {amount} coins"
        )))
    } else {
        Err(EngineError::AccountNotFound(account_id.to_string()))
    }
}

/// Add `amount` coins to `account_id`.
pub(crate) async fn credit<C>(conn: &C, account_id: i32, amount: i64) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    if apply_delta(conn, account_id, amount).await? {
        Ok(())
    } else {
        Err(EngineError::AccountNotFound(account_id.to_string()))
    }
}

pub(crate) async fn account_exists<C>(conn: &C, account_id: i32) -> ResultEngine<bool>
where
    C: ConnectionTrait,
{
    Ok(accounts::Entity::find_by_id(account_id)
        .one(conn)
        .await?
        .is_some())
}
