use std::time::Duration;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use sea_orm::ConnectOptions;
use settings::Database;

mod settings;

#[derive(Debug, Parser)]
#[command(name = "merchshop", about = "Merch shop backend")]
struct Args {
    /// Settings file, without extension.
    #[arg(long, env = "MERCHSHOP_CONFIG", default_value = "settings")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let settings = settings::Settings::new(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "merchshop={level},server={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect_database(&settings.server).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .starting_balance(settings.engine.starting_balance)
        .retry_policy(settings.engine.retry_policy())
        .deadline(settings.engine.deadline())
        .build()
        .await?;

    let auth = server::AuthConfig {
        signing_key: settings.auth.signing_key.clone(),
        token_ttl: Duration::from_secs(settings.auth.token_ttl_secs),
    };

    let bind = settings
        .server
        .bind
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(engine, &auth, listener, shutdown_signal()).await?;
    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn connect_database(
    config: &settings::Server,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = match &config.database {
        // Every connection to `sqlite::memory:` sees its own database.
        Database::Memory => {
            let mut options = ConnectOptions::new("sqlite::memory:");
            options.max_connections(1).min_connections(1);
            options
        }
        Database::Sqlite(path) => ConnectOptions::new(format!("sqlite:{path}?mode=rwc")),
        Database::Postgres(url) => ConnectOptions::new(url.clone()),
    };
    if let Some(max) = config.max_connections
        && !matches!(config.database, Database::Memory)
    {
        options.max_connections(max);
    }
    options.sqlx_logging(false);

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
