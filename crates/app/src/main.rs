use clap::Parser;
use ledger::{Ledger, SqlStore};
use migration::{Migrator, MigratorTrait};
use settings::Database;

use crate::error::{AppError, Result};

mod cli;
mod commands;
mod error;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let settings = settings::Settings::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "familyflow={level},ledger={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    if settings.profile.is_empty() {
        return Err(AppError::Usage(
            "no profile configured: pass --profile or set FAMILYFLOW_PROFILE".to_string(),
        ));
    }

    let database = parse_database(&settings.database).await?;
    let mut ledger = Ledger::new(SqlStore::new(database), settings.profile);
    commands::run(&mut ledger, cli.command).await
}

async fn parse_database(config: &Database) -> Result<sea_orm::DatabaseConnection> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::debug!("database ready");
    Ok(database)
}
