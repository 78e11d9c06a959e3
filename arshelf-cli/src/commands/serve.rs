//! HTTP server command
//!
//! Settings are layered: built-in defaults, `--config` TOML file, `ARSHELF_*`
//! environment, then the flags below.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use arshelf_server::db::{create_pool, migrations};
use arshelf_server::{run_server, MemoryStore, PgStore, ServerConfig, Store};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// TOML config file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory with the browser client (index.html is the fallback)
    #[arg(long, value_name = "DIR")]
    pub public_dir: Option<PathBuf>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Keep everything in memory instead of Postgres (lost on exit)
    #[arg(long)]
    pub memory: bool,

    /// Skip schema migrations at startup
    #[arg(long)]
    pub no_migrate: bool,
}

/// Resolve the final server configuration from file, environment and flags.
pub fn resolve_config(args: &ServeArgs) -> Result<ServerConfig> {
    let config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let mut config = config
        .apply_env()
        .context("Invalid ARSHELF_* environment variable")?;

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = &args.public_dir {
        config.public_dir = Some(dir.clone());
    }
    if args.cors_permissive {
        config.cors_permissive = true;
    }
    if let Some(url) = &args.database_url {
        config.database_url = Some(url.clone());
    }
    Ok(config)
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    let store: Arc<dyn Store> = if args.memory {
        tracing::warn!("Using in-memory store - data is lost on shutdown");
        Arc::new(MemoryStore::new())
    } else {
        let database_url = config.database_url.as_deref().context(
            "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, the config file, or use --memory",
        )?;
        let pool = create_pool(database_url)
            .await
            .context("Failed to create database pool")?;
        if !args.no_migrate {
            migrations::run(&pool)
                .await
                .context("Failed to run migrations")?;
        }
        Arc::new(PgStore::new(pool))
    };

    tracing::info!("Starting arshelf server on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(store, config).await.context("Server error")?;

    Ok(())
}
