use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use dotenv::dotenv;
use steam_harvest::config;
use steam_harvest::db::Db;
use steam_harvest::enumerate;
use steam_harvest::harvest;
use steam_harvest::pace::FixedDelay;
use steam_harvest::storage::postgres::PostgresStore;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "steam-harvest", version, about = "Steam catalog collection CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Enumerate every game app id from the storefront catalog into the record file
    GatherAllIds,
    /// Fetch details for each record-file id and store them in the database
    StoreDetails,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::GatherAllIds) => {
            let api_key = config::load_api_key();
            enumerate::gather_all_ids(&api_key).await?;
        }
        Some(Commands::StoreDetails) => {
            let database_url =
                std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
            let db = Db::connect(&database_url, config::env_u32("DB_MAX_CONNS", 5)).await?;
            let store = PostgresStore::new(db);
            let pacer = FixedDelay::new(Duration::from_millis(config::env_u64(
                "HARVEST_PAUSE_MS",
                1500,
            )));
            harvest::store_app_details(&config::record_file(), &store, &pacer).await?;
        }
        None => {
            Cli::command().print_help()?;
        }
    }
    Ok(())
}
