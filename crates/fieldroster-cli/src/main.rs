use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod db_cmd;
mod roster;
mod search;

use db_cmd::DbCommands;
use roster::RosterCommands;

#[derive(Debug, Parser)]
#[command(name = "fieldroster")]
#[command(about = "Field technician roster: import, manage, search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Roster management: import, export, add, remove
    Roster {
        #[command(subcommand)]
        command: RosterCommands,
    },
    /// Find technicians near a location
    Search {
        /// Free-text location: an address, ZIP, city, or state
        query: String,

        /// Maximum results to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = fieldroster_core::load_app_config()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pool = fieldroster_db::connect_pool(
        &config.database_url,
        fieldroster_db::PoolConfig {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        },
    )
    .await?;
    match cli.command {
        Commands::Db { command } => db_cmd::run(&pool, command).await,
        Commands::Roster { command } => roster::run(&pool, &config, command).await,
        Commands::Search { query, limit } => search::run(&pool, &config, &query, limit).await,
    }
}

#[cfg(test)]
mod tests;
