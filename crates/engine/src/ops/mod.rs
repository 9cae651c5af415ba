use std::{future::Future, time::Duration};

use rand::Rng;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, IsolationLevel,
    TransactionTrait,
};

use crate::{EngineError, ResultEngine};

mod accounts;
mod info;
mod purchase;
mod transfer;

/// Coins credited to every new account.
pub const DEFAULT_STARTING_BALANCE: i64 = 1000;

const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);
const MAX_USERNAME_LEN: usize = 50;

/// Run a block inside a serializable unit of work, committing on success.
///
/// On error the transaction is dropped, which rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.begin_unit_of_work().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Bounded retry of units of work aborted by a concurrent conflict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Call `attempt` until it succeeds, fails with a non transient error or
    /// the attempts are exhausted.
    pub(crate) async fn run<T, F, Fut>(&self, op: &'static str, mut attempt: F) -> ResultEngine<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ResultEngine<T>>,
    {
        let mut backoff = self.base_backoff;
        let mut tries = 1;
        loop {
            match attempt().await {
                Err(err) if err.is_transient() && tries < self.max_attempts => {
                    tracing::debug!(op, attempt = tries, error = %err, "retrying unit of work");
                    tokio::time::sleep(jittered(backoff)).await;
                    backoff = backoff.saturating_mul(2).min(self.max_backoff);
                    tries += 1;
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(op, attempts = tries, error = %err, "giving up on unit of work");
                    return Err(err);
                }
                result => return result,
            }
        }
    }
}

/// A uniform delay between half and all of `backoff`.
fn jittered(backoff: Duration) -> Duration {
    backoff.mul_f64(rand::thread_rng().gen_range(0.5..=1.0))
}

#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    starting_balance: i64,
    retry: RetryPolicy,
    deadline: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn starting_balance(&self) -> i64 {
        self.starting_balance
    }

    /// Open a transaction for a balance-mutating unit of work.
    ///
    /// SQLite write transactions are already serial and reject an explicit
    /// isolation level, so it is requested only on the other backends.
    async fn begin_unit_of_work(&self) -> ResultEngine<DatabaseTransaction> {
        let isolation = match self.database.get_database_backend() {
            DbBackend::Sqlite => None,
            _ => Some(IsolationLevel::Serializable),
        };
        Ok(self.database.begin_with_config(isolation, None).await?)
    }

    /// Run `attempt` under the retry policy, bounded by the engine deadline.
    ///
    /// When the deadline fires the in-flight attempt is dropped together with
    /// its open transaction, so nothing it wrote survives.
    async fn run_unit_of_work<T, F, Fut>(&self, op: &'static str, attempt: F) -> ResultEngine<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ResultEngine<T>>,
    {
        match tokio::time::timeout(self.deadline, self.retry.run(op, attempt)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, deadline = ?self.deadline, "unit of work deadline exceeded");
                Err(EngineError::DeadlineExceeded(self.deadline))
            }
        }
    }
}

fn normalize_username(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidUsername(
            "username must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(EngineError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Debug)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    starting_balance: i64,
    retry: RetryPolicy,
    deadline: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            starting_balance: DEFAULT_STARTING_BALANCE,
            retry: RetryPolicy::default(),
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn starting_balance(mut self, coins: i64) -> EngineBuilder {
        self.starting_balance = coins;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> EngineBuilder {
        self.retry = retry;
        self
    }

    /// Upper bound on a single mutating call, retries included.
    pub fn deadline(mut self, deadline: Duration) -> EngineBuilder {
        self.deadline = deadline;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.starting_balance < 0 {
            return Err(EngineError::InvalidAmount(
                "starting balance must not be negative".to_string(),
            ));
        }
        self.database.ping().await?;

        Ok(Engine {
            database: self.database,
            starting_balance: self.starting_balance,
            retry: self.retry,
            deadline: self.deadline,
        })
    }
}
