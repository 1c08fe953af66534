//! SchoolHub presence engine: runs one signed-in session against an
//! in-process document store.
//!
//! Main entry point that wires all crates together and keeps the session
//! alive until Ctrl+C.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use schoolhub_core::types::clock::{Clock, SystemClock};
use schoolhub_core::types::id::PrincipalId;
use schoolhub_entity::principal::AuthIdentity;
use schoolhub_realtime::{ClientInfo, PresenceEngine};
use schoolhub_store::MemoryDocumentStore;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "schoolhub-engine", version, about = "SchoolHub presence engine")]
struct Args {
    /// Configuration environment overlay (`config/{env}.toml`).
    #[arg(long, default_value = "development")]
    env: String,

    /// Principal id; a random one is used when omitted.
    #[arg(long)]
    id: Option<Uuid>,

    /// Email of the principal to sign in.
    #[arg(long, default_value = "admin@school.test")]
    email: String,

    /// Display name of the principal.
    #[arg(long)]
    name: Option<String>,

    /// User-agent string recorded on the session.
    #[arg(long)]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match AppConfig::load(&args.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(args, config).await {
        tracing::error!(error = %e, "Engine error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(args: Args, config: AppConfig) -> Result<(), AppError> {
    tracing::info!(env = %args.env, "Starting SchoolHub engine v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(MemoryDocumentStore::with_clock(clock.clone()));
    let report_every = config.presence.heartbeat_interval();
    let engine = PresenceEngine::new(store, clock.clone(), config);

    let identity = AuthIdentity {
        id: args.id.map(PrincipalId::from_uuid).unwrap_or_default(),
        email: args.email,
        display_name: args.name,
    };
    let principal = engine.directory().resolve(&identity).await?;

    let session = engine
        .sign_in(
            principal,
            ClientInfo {
                user_agent: args.user_agent,
                geo: None,
            },
        )
        .await?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut report = tokio::time::interval(report_every);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, signing out...");
                break;
            }
            _ = report.tick() => {
                let now = clock.now();
                let roster = session.roster().await;
                let unread = session.unread().snapshot();
                tracing::info!(
                    online = roster.online(now).len(),
                    known = roster.samples().len(),
                    unread = unread.unread_count,
                    toasts = session.toasts().len(),
                    "Session status"
                );
            }
        }
    }

    session.sign_out().await;
    tracing::info!("SchoolHub engine shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
