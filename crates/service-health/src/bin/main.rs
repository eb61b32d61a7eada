//! Service Health entry point
//!
//! Serves the HTTP API or runs checks from the command line.

use clap::{Parser, Subcommand};
use service_health::config::HealthConfig;
use service_health::contracts::*;
use service_health::engine::Dispatcher;
use service_health::handler::{create_router, AppState};
use service_health::store::{JsonFileStore, MemoryStore, ServiceStore};
use service_health::transport::{DefaultClientProvider, RestAdapter};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "service-health")]
#[command(about = "Service Health - SOAP/REST health checks with response validation")]
#[command(version)]
struct Cli {
    /// Path to the service store
    #[arg(long, global = true, env = "SERVICE_HEALTH_STORE")]
    store: Option<PathBuf>,

    /// Maximum number of checks running at once
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Outer timeout per check in milliseconds
    #[arg(long, global = true)]
    check_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Check definitions from a file without storing them
    Check {
        /// Path to definitions file (JSON/YAML list)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Check every stored service
    Run,

    /// Store definitions from a file
    Add {
        /// Path to definitions file (JSON/YAML list)
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = Cli::parse();

    let mut config = HealthConfig::from_env();
    if let Some(path) = cli.store {
        config.store_path = path;
    }
    if let Some(n) = cli.concurrency.filter(|n| *n > 0) {
        config.max_concurrency = n;
    }
    if let Some(ms) = cli.check_timeout_ms.filter(|ms| *ms > 0) {
        config.check_timeout = Some(Duration::from_millis(ms));
    }

    match cli.command {
        Commands::Serve { port, host } => {
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let store = Arc::new(JsonFileStore::open(&config.store_path).await?);
            tracing::info!(store = %store.path().display(), "Using service store");

            let dispatcher = Arc::new(build_dispatcher(store, &config));
            let router = create_router(Arc::new(AppState::new(dispatcher)));

            tracing::info!("Starting Service Health on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await?;
        }

        Commands::Check { file } => {
            let definitions = read_definitions(&file)?;
            let store = Arc::new(MemoryStore::new());
            let dispatcher = Arc::new(build_dispatcher(store, &config));

            let report = dispatcher.run_all(definitions).await;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if !report.all_passed() {
                std::process::exit(1);
            }
        }

        Commands::Run => {
            let store = Arc::new(JsonFileStore::open(&config.store_path).await?);
            let dispatcher = Arc::new(build_dispatcher(store, &config));

            let report = dispatcher.run_all_stored().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if !report.all_passed() {
                std::process::exit(1);
            }
        }

        Commands::Add { file } => {
            let store = JsonFileStore::open(&config.store_path).await?;
            for definition in read_definitions(&file)? {
                let stored = store.upsert(definition).await?;
                println!("Stored service '{}'", stored.id);
            }
        }
    }

    Ok(())
}

fn build_dispatcher(store: Arc<dyn ServiceStore>, config: &HealthConfig) -> Dispatcher {
    let provider = Arc::new(DefaultClientProvider::new());
    Dispatcher::new(store)
        .with_adapter(Arc::new(RestAdapter::new(provider)))
        .with_config(config.dispatcher())
}

fn read_definitions(path: &Path) -> anyhow::Result<Vec<ServiceDefinition>> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    let definitions = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(definitions)
}
