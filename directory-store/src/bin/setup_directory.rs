//! Resets the directory database with the Bangalore locality rows.
//!
//! Honors `DIRECTORY_DB_PATH`; the seed set defaults to `localities` here.

use anyhow::Context;
use colored::Colorize;
use directory_store::{DirectoryConfig, DirectoryStore, SeedSet};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = DirectoryConfig::from_env_with_seed(SeedSet::Localities)
        .context("reading directory config")?;

    let mut store = DirectoryStore::open(&cfg.db_path)
        .with_context(|| format!("opening {}", cfg.db_path.display()))?;
    let inserted = store.reset(cfg.seed).context("resetting directory")?;

    println!(
        "{} Database '{}' created with {} {} rows",
        "✔".green().bold(),
        cfg.db_path.display().to_string().cyan(),
        inserted.to_string().bold(),
        cfg.seed
    );
    Ok(())
}
