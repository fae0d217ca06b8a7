//! redirectd — the foundry redirect daemon.
//!
//! Opens the entry store, builds the registry, and serves the HTTP API.
//!
//! # Usage
//!
//! ```text
//! redirectd serve --config /etc/foundry-redirect/redirect.toml
//! redirectd serve --in-memory --bind 127.0.0.1:8080
//! redirectd list --data-dir /var/lib/foundry-redirect
//! redirectd init-config > redirect.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use redirect_core::RedirectConfig;
use redirect_registry::Registry;
use redirect_state::{RedirectStore, StateStore};
use tracing::info;

const DB_FILE: &str = "redirects.redb";

#[derive(Parser)]
#[command(name = "redirectd", about = "Foundry redirect registry daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Options shared by commands that open the store.
#[derive(clap::Args)]
struct StoreArgs {
    /// Path to redirect.toml. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the database file. Overrides `store.path`.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the redirect API.
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Address to listen on. Overrides `server.bind`.
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Keep entries in memory only.
        #[arg(long)]
        in_memory: bool,

        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,
    },

    /// Print every stored entry as a JSON line.
    List {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print the default configuration.
    InitConfig,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,redirectd=debug,redirect=debug".parse().unwrap());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &StoreArgs) -> anyhow::Result<RedirectConfig> {
    let mut config = match &args.config {
        Some(path) => RedirectConfig::from_file(path)?,
        None => RedirectConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.store.path = dir.join(DB_FILE);
    }
    Ok(config)
}

fn open_store(config: &RedirectConfig) -> anyhow::Result<StateStore> {
    let store = if config.store.in_memory {
        StateStore::open_in_memory(&config.store.table)?
    } else {
        if let Some(parent) = config.store.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        StateStore::open(&config.store.path, &config.store.table)?
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            store,
            bind,
            in_memory,
            log_json,
        } => {
            init_tracing(log_json);
            let mut config = load_config(&store)?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            config.store.in_memory |= in_memory;
            run_server(config).await
        }
        Command::List { store } => {
            init_tracing(false);
            let config = load_config(&store)?;
            let store = open_store(&config)?;
            for entry in store.list_entries()? {
                println!("{}", serde_json::to_string(&entry)?);
            }
            Ok(())
        }
        Command::InitConfig => {
            print!("{}", RedirectConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

async fn run_server(config: RedirectConfig) -> anyhow::Result<()> {
    info!("foundry redirect daemon starting");

    let store = open_store(&config)?;
    info!(
        table = store.table_name(),
        in_memory = config.store.in_memory,
        path = ?config.store.path,
        "redirect store opened"
    );

    let registry = Registry::new(Arc::new(store), &config.registry)?;
    info!(
        reserved_prefix = %config.registry.reserved_prefix,
        max_allocation_attempts = config.registry.max_allocation_attempts,
        "registry initialized"
    );

    let router = redirect_api::build_router(Arc::new(registry));
    let addr = config.server.bind;

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("foundry redirect daemon stopped");
    Ok(())
}
