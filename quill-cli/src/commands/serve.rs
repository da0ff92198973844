//! HTTP server command

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use quill_server::http::{run_server, AppState, ServerConfig};
use quill_server::{ContentStore, MemoryStore, PgStore};

use crate::config::QuillConfig;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to [default: server.bind from config, else 127.0.0.1:3030]
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Keep content in memory instead of PostgreSQL (lost on exit)
    #[arg(long)]
    pub memory: bool,

    /// Mount the unauthenticated /admin routes
    #[arg(long)]
    pub admin: bool,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: QuillConfig) -> Result<()> {
    let store: Arc<dyn ContentStore> = if args.memory {
        tracing::warn!("Using in-memory store; content is discarded on shutdown");
        Arc::new(MemoryStore::new())
    } else {
        let database_url = args
            .database_url
            .or(config.database.url)
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, database.url in config, or use --memory")?;

        let store = PgStore::connect(&database_url, config.database.max_connections)
            .await
            .context("Failed to create database pool")?;
        store.migrate().await.context("Failed to run migrations")?;
        Arc::new(store)
    };

    let server = ServerConfig {
        bind_addr: args.bind.unwrap_or(config.server.bind),
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
        admin_enabled: args.admin || config.server.admin_enabled,
    };

    tracing::info!(
        page_size = config.blog.page_size,
        related_count = config.blog.related_count,
        "Starting quill server on {}",
        server.bind_addr
    );

    // Blocks until shutdown
    run_server(AppState::new(store, config.blog), server)
        .await
        .context("Server error")?;

    Ok(())
}
