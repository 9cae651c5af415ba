//! Handles settings for the application.
//!
//! Settings are read from an optional TOML file (see `settings.toml` at the
//! repository root) and overridden by `MERCHSHOP__<SECTION>__<KEY>`
//! environment variables.
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    /// Path of the database file, created when missing.
    Sqlite(String),
    /// Connection URL.
    Postgres(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub signing_key: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Engine {
    pub starting_balance: i64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub max_retry_backoff_ms: u64,
    pub unit_of_work_timeout_ms: u64,
}

impl Default for Engine {
    fn default() -> Self {
        let retry = engine::RetryPolicy::default();
        Self {
            starting_balance: engine::DEFAULT_STARTING_BALANCE,
            max_attempts: retry.max_attempts,
            retry_backoff_ms: 10,
            max_retry_backoff_ms: 200,
            unit_of_work_timeout_ms: 5000,
        }
    }
}

impl Engine {
    pub fn retry_policy(&self) -> engine::RetryPolicy {
        engine::RetryPolicy {
            max_attempts: self.max_attempts,
            base_backoff: Duration::from_millis(self.retry_backoff_ms),
            max_backoff: Duration::from_millis(self.max_retry_backoff_ms),
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.unit_of_work_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    pub auth: Auth,
    #[serde(default)]
    pub engine: Engine,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("MERCHSHOP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let settings = parse(
            r#"
            [server]
            port = 8080
            database = "memory"

            [auth]
            signing_key = "secret"
            "#,
        );

        assert_eq!(settings.app.level, "info");
        assert!(matches!(settings.server.database, Database::Memory));
        assert_eq!(settings.auth.token_ttl_secs, 86400);
        assert_eq!(settings.engine.starting_balance, 1000);
        assert_eq!(settings.engine.retry_policy(), engine::RetryPolicy::default());
        assert_eq!(settings.engine.deadline(), Duration::from_secs(5));
    }

    #[test]
    fn database_variants_carry_their_target() {
        let settings = parse(
            r#"
            [server]
            port = 8080
            database = { postgres = "postgres://shop@localhost/shop" }

            [auth]
            signing_key = "secret"

            [engine]
            max_attempts = 2
            "#,
        );

        assert!(matches!(
            settings.server.database,
            Database::Postgres(ref url) if url == "postgres://shop@localhost/shop"
        ));
        assert_eq!(settings.engine.max_attempts, 2);
        assert_eq!(settings.engine.starting_balance, 1000);
    }
}
