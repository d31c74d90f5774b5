use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cache;
mod commands;
mod render;

#[derive(Debug, Parser)]
#[command(name = "potency")]
#[command(about = "Extract, merge and compare cannabinoid and terpene potency data")]
struct Cli {
    /// Insight cache file (overrides `POTENCY_CACHE_PATH`).
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract an insight from a JSON product record and merge it into the cache.
    Extract {
        /// JSON file holding one record or an array of records.
        file: PathBuf,
        /// Cache key; defaults to the record's derived URL.
        #[arg(long)]
        key: Option<String>,
        /// URL used when the record carries no slug or id.
        #[arg(long)]
        url: Option<String>,
    },
    /// Extract an insight from a saved product page and merge it into the cache.
    Scan {
        html_file: PathBuf,
        #[arg(long)]
        key: String,
        #[arg(long)]
        url: Option<String>,
    },
    /// Fetch a product page and merge what it reveals.
    Fetch {
        url: String,
        /// Fetch even when the cached insight is already detailed.
        #[arg(long)]
        force: bool,
    },
    /// Print one cached insight.
    Show { key: String },
    /// Compare two or three cached products.
    Compare {
        #[arg(num_args = 2..=3, required = true)]
        keys: Vec<String>,
        /// Fetch pages for products missing detail before comparing.
        #[arg(long)]
        fetch: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = potency_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cache_path = cli.cache.unwrap_or_else(|| config.cache_path.clone());
    let store = cache::load_store(&cache_path, config.terpene_merge_policy)?;

    let dirty = match cli.command {
        Commands::Extract { file, key, url } => {
            commands::run_extract(&store, &config, &file, key.as_deref(), url.as_deref())?;
            true
        }
        Commands::Scan {
            html_file,
            key,
            url,
        } => {
            commands::run_scan(&store, &html_file, &key, url.as_deref())?;
            true
        }
        Commands::Fetch { url, force } => {
            commands::run_fetch(&store, &config, &url, force).await?;
            true
        }
        Commands::Show { key } => {
            commands::run_show(&store, &key)?;
            false
        }
        Commands::Compare { keys, fetch } => {
            commands::run_compare(&store, &config, &keys, fetch).await?;
            fetch
        }
    };

    if dirty {
        cache::save_store(&cache_path, &store)?;
    }

    Ok(())
}
