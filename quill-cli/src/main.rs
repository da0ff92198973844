//! quill CLI - run and administer the blog server
//!
//! - `serve`: JSON HTTP API over PostgreSQL (or an in-memory store)
//! - `migrate`: create/upgrade the schema
//! - `config`: inspect or create `~/.quill/config.toml`

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

use config::QuillConfig;

#[derive(Parser, Debug)]
#[command(
    name = "quill",
    author,
    version,
    about = "Small blog server: posts, categories, tags and moderated comments"
)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Config file [default: ~/.quill/config.toml]
    #[arg(long, global = true, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(commands::serve::ServeArgs),
    /// Create or upgrade the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Inspect or create the config file
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    let config_path = cli.config.unwrap_or_else(QuillConfig::default_path);

    match cli.command {
        Commands::Serve(args) => {
            commands::run_serve(args, QuillConfig::load(&config_path)?).await?
        }
        Commands::Migrate(args) => {
            commands::run_migrate(args, QuillConfig::load(&config_path)?).await?
        }
        Commands::Config(args) => config::run_config(args, &config_path)?,
    }
    Ok(())
}
