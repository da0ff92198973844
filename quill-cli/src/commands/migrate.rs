//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use quill_server::PgStore;

use crate::config::QuillConfig;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

/// Create or upgrade the blog schema, then exit.
pub async fn run_migrate(args: MigrateArgs, config: QuillConfig) -> Result<()> {
    let database_url = args
        .database_url
        .or(config.database.url)
        .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or database.url in config")?;

    let store = PgStore::connect(&database_url, 1)
        .await
        .context("Failed to connect to database")?;
    store.migrate().await.context("Failed to run migrations")?;

    println!("Schema is up to date");
    Ok(())
}
