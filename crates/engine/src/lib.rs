//! Ledger engine of the merch shop.
//!
//! Accounts hold a coin balance that is spent on merchandise or sent to other
//! accounts. Every balance change runs inside a single store transaction
//! together with the history row that records it; see [`balance`] for the
//! conditional update that keeps balances non-negative under concurrency.

pub use accounts::Account;
pub use error::EngineError;
pub use info::{AccountInfo, CoinHistory, InventoryRow, ReceivedCoins, SentCoins};
pub use merchandise::MerchandiseItem;
pub use ops::{DEFAULT_STARTING_BALANCE, Engine, EngineBuilder, RetryPolicy};
pub use purchases::Purchase;
pub use transfers::Transfer;

pub mod accounts;
pub mod balance;
mod error;
mod info;
pub mod merchandise;
mod ops;
pub mod purchases;
pub mod transfers;

pub type ResultEngine<T> = Result<T, EngineError>;
