//! Penlock server binary.
//!
//! # Usage
//!
//! ```bash
//! # Advisory expiry, documents seeded from ./docs
//! penlock-server --seed-dir ./docs
//!
//! # Enforce 5 minute locks, sweeping every 10 seconds
//! penlock-server --lock-minutes 5 --enforce-expiry --sweep-interval-secs 10
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use penlock_core::StoreConfig;
use penlock_server::{ExpiryPolicy, Server, ServerConfig, ServerError, SystemEnv, seed};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Penlock document store
#[derive(Parser, Debug)]
#[command(name = "penlock-server")]
#[command(about = "Lease-based document locking store")]
#[command(version)]
struct Args {
    /// Lock lifetime in minutes
    #[arg(long, default_value = "10")]
    lock_minutes: u64,

    /// Evict locks once their expiry passes
    #[arg(long)]
    enforce_expiry: bool,

    /// Seconds between expiry sweeps (with --enforce-expiry)
    #[arg(long, default_value = "30")]
    sweep_interval_secs: u64,

    /// Directory whose files seed the store
    #[arg(long)]
    seed_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn server_config(&self) -> Result<ServerConfig, ServerError> {
        let lock_secs = self.lock_minutes.checked_mul(60).ok_or_else(|| {
            ServerError::Config(format!("lock duration of {} minutes overflows", self.lock_minutes))
        })?;

        let expiry = if self.enforce_expiry {
            ExpiryPolicy::Enforced { sweep_interval: Duration::from_secs(self.sweep_interval_secs) }
        } else {
            ExpiryPolicy::Advisory
        };

        Ok(ServerConfig { store: StoreConfig { lock_duration: Duration::from_secs(lock_secs) }, expiry })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Penlock server starting");

    let server = Server::start(SystemEnv::new(), args.server_config()?)?;

    if let Some(dir) = &args.seed_dir {
        let docs = seed::load_seed_dir(dir).await?;
        let count = seed::seed_service(server.service(), docs).await?;
        tracing::info!("Seeded {} documents from {}", count, dir.display());
    }

    if !server.enforces_expiry() {
        tracing::warn!("Lock expiry is advisory - stale locks are held until saved or released");
    }

    let (documents, locked) = server.service().counts().await;
    tracing::info!("Serving {} documents ({} locked)", documents, locked);

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutdown requested");
    server.shutdown();

    Ok(())
}
