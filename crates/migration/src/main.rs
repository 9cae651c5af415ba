use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

#[derive(Debug, Parser)]
#[command(name = "migration", about = "Manage the merch shop database schema")]
struct Args {
    /// Store to migrate.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./merchshop.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations.
    Up {
        /// Apply at most this many.
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Revert applied migrations, the last one by default.
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and reapply all migrations, catalog seed included.
    Fresh,
    /// List applied and pending migrations.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let db = Database::connect(&args.database_url).await?;

    match args.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => Migrator::up(&db, steps).await?,
        Command::Down { steps } => Migrator::down(&db, Some(steps)).await?,
        Command::Fresh => Migrator::fresh(&db).await?,
        Command::Status => Migrator::status(&db).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_and_steps() {
        let args = Args::try_parse_from(["migration", "--database-url", "sqlite::memory:"]).unwrap();
        assert_eq!(args.database_url, "sqlite::memory:");
        assert!(args.command.is_none());

        let args = Args::try_parse_from(["migration", "down", "--steps", "2"]).unwrap();
        assert!(matches!(args.command, Some(Command::Down { steps: 2 })));

        let args = Args::try_parse_from(["migration", "down"]).unwrap();
        assert!(matches!(args.command, Some(Command::Down { steps: 1 })));

        assert!(Args::try_parse_from(["migration", "sideways"]).is_err());
    }
}
