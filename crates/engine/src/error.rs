//! The module contains the errors the engine can throw.
//!
//! Errors fall in two groups:
//!
//! - business outcomes ([`ItemNotFound`], [`InvalidQuantity`],
//!   [`InvalidAmount`], [`InsufficientFunds`], [`SelfTransfer`],
//!   [`AccountNotFound`], ...): expected, always rolled back, returned to the
//!   caller as typed values.
//! - infrastructure failures ([`TransientConflict`], [`StoreUnavailable`],
//!   [`DeadlineExceeded`], [`Database`]): propagated unchanged for the API
//!   layer to translate.
//!
//! A [`DbErr`] converts into the variant matching its cause, so `?` on a
//! sea-orm call already classifies serialization aborts as
//! [`TransientConflict`].
//!
//!  [`ItemNotFound`]: EngineError::ItemNotFound
//!  [`InvalidQuantity`]: EngineError::InvalidQuantity
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`SelfTransfer`]: EngineError::SelfTransfer
//!  [`AccountNotFound`]: EngineError::AccountNotFound
//!  [`TransientConflict`]: EngineError::TransientConflict
//!  [`StoreUnavailable`]: EngineError::StoreUnavailable
//!  [`DeadlineExceeded`]: EngineError::DeadlineExceeded
//!  [`Database`]: EngineError::Database
use std::time::Duration;

use sea_orm::{DbErr, RuntimeErr, sqlx};
use thiserror::Error;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" item not found!")]
    ItemNotFound(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Sender and receiver are the same account")]
    SelfTransfer,
    #[error("\"{0}\" account not found!")]
    AccountNotFound(String),
    #[error("Invalid username: {0}")]
    InvalidUsername(String),
    #[error("\"{0}\" already present!")]
    ExistingAccount(String),
    #[error("Concurrent update conflict: {0}")]
    TransientConflict(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Whether retrying the same unit of work with the same inputs may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientConflict(_))
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if is_serialization_failure(&err) {
            return Self::TransientConflict(err.to_string());
        }
        match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => Self::StoreUnavailable(err.to_string()),
            other => Self::Database(other),
        }
    }
}

fn is_serialization_failure(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return false,
    };
    let RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) = runtime else {
        return false;
    };

    if db_err
        .try_downcast_ref::<sqlx::sqlite::SqliteError>()
        .is_some()
    {
        return db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(sqlite_code_is_transient);
    }
    db_err.code().is_some_and(|code| postgres_code_is_transient(&code))
}

/// `serialization_failure` and `deadlock_detected`.
fn postgres_code_is_transient(code: &str) -> bool {
    matches!(code, "40001" | "40P01")
}

/// SQLite reports extended result codes; the low byte is the primary code.
fn sqlite_code_is_transient(code: i32) -> bool {
    matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ItemNotFound(a), Self::ItemNotFound(b)) => a == b,
            (Self::InvalidQuantity(a), Self::InvalidQuantity(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::SelfTransfer, Self::SelfTransfer) => true,
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (Self::InvalidUsername(a), Self::InvalidUsername(b)) => a == b,
            (Self::ExistingAccount(a), Self::ExistingAccount(b)) => a == b,
            (Self::TransientConflict(a), Self::TransientConflict(b)) => a == b,
            (Self::StoreUnavailable(a), Self::StoreUnavailable(b)) => a == b,
            (Self::DeadlineExceeded(a), Self::DeadlineExceeded(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::ConnAcquireErr;

    use super::*;

    #[test]
    fn postgres_serialization_codes_are_transient() {
        assert!(postgres_code_is_transient("40001"));
        assert!(postgres_code_is_transient("40P01"));
        assert!(!postgres_code_is_transient("23505"));
        assert!(!postgres_code_is_transient("23514"));
    }

    #[test]
    fn sqlite_busy_and_locked_are_transient() {
        assert!(sqlite_code_is_transient(5));
        assert!(sqlite_code_is_transient(6));
        // SQLITE_BUSY_SNAPSHOT
        assert!(sqlite_code_is_transient(517));
        // SQLITE_CONSTRAINT_CHECK
        assert!(!sqlite_code_is_transient(275));
    }

    #[test]
    fn acquire_timeout_is_store_unavailable() {
        let err = EngineError::from(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout));
        assert!(matches!(err, EngineError::StoreUnavailable(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn other_db_errors_stay_opaque() {
        let err = EngineError::from(DbErr::RecordNotFound("accounts".to_string()));
        assert_eq!(
            err,
            EngineError::Database(DbErr::RecordNotFound("accounts".to_string()))
        );
    }
}
