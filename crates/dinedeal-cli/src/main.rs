mod check;
mod scrape;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::scrape::ScrapeOptions;

#[derive(Debug, Parser)]
#[command(name = "dinedeal")]
#[command(about = "Dining offer scraper")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape offers for every place with a due provider
    Scrape {
        /// Dotenv file with credentials, loaded before `.env`
        #[arg(long)]
        credentials: Option<PathBuf>,

        /// Ignore refresh intervals and scrape every provider
        #[arg(long)]
        force: bool,

        /// Restrict the run to this place id (repeatable)
        #[arg(long = "place-id")]
        place_id: Vec<String>,

        /// Print the due tasks without fetching or writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch and parse pages directly and print what the parser finds
    Check {
        /// `provider=url` to check (repeatable); defaults to one page per provider
        #[arg(long)]
        pair: Vec<String>,
    },
    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scrape {
            credentials,
            force,
            place_id,
            dry_run,
        }) => {
            let config = dinedeal_core::load_app_config(credentials.as_deref())?;
            init_tracing(&config.log_level)?;
            let options = ScrapeOptions {
                force,
                place_ids: place_id,
                dry_run,
            };
            scrape::run_scrape_command(&config, &options).await?;
        }
        Some(Commands::Check { pair }) => {
            dotenvy::dotenv().ok();
            let level = std::env::var("DINEDEAL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            init_tracing(&level)?;
            check::run_check(&pair).await?;
        }
        Some(Commands::Db { command }) => {
            let config = dinedeal_core::load_app_config(None)?;
            init_tracing(&config.log_level)?;
            run_db_command(&config, command).await?;
        }
        None => Cli::command().print_help()?,
    }

    Ok(())
}

/// `RUST_LOG` wins over `level` when set.
fn init_tracing(level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

async fn run_db_command(
    config: &dinedeal_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    let pool_config = dinedeal_db::PoolConfig::from_app_config(config);
    let pool = dinedeal_db::connect_pool(&config.database_url, pool_config).await?;
    match command {
        DbCommands::Ping => {
            dinedeal_db::ping(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = dinedeal_db::run_migrations(&pool).await?;
            println!("migrations up to date ({applied} applied)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
