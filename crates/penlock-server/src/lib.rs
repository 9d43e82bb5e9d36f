//! Penlock document store host.
//!
//! This crate hosts a `DocumentStore` for concurrent callers using:
//! - A tokio mutex so each store operation is atomic
//! - System time and cryptographic RNG
//! - An optional sweeper that enforces lock expiry
//!
//! ## Architecture
//!
//! ```text
//! penlock-server
//!   ├─ SystemEnv         (production Environment impl)
//!   ├─ DocumentService   (shared handle, one mutex around the store)
//!   ├─ ExpirySweeper     (evicts stale locks under ExpiryPolicy::Enforced)
//!   └─ seed              (initial documents from a directory)
//! ```
//!
//! Transports are not part of this crate; they call into `DocumentService`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod seed;
mod service;
mod sweeper;
mod system_env;

pub use config::{ExpiryPolicy, MAX_LOCK_DURATION, ServerConfig};
pub use error::ServerError;
use penlock_core::Environment;
pub use service::DocumentService;
pub use sweeper::ExpirySweeper;
pub use system_env::SystemEnv;

/// A running document store host.
///
/// Owns the shared service and, under an enforced expiry policy, the sweeper
/// task.
#[derive(Debug)]
pub struct Server<E>
where
    E: Environment,
{
    service: DocumentService<E>,
    sweeper: Option<ExpirySweeper>,
    config: ServerConfig,
}

impl<E> Server<E>
where
    E: Environment,
{
    /// Validate the configuration and start hosting an empty store.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid, or if
    /// expiry is enforced and no tokio runtime is available for the sweeper.
    pub fn start(env: E, config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        if matches!(config.expiry, ExpiryPolicy::Enforced { .. })
            && tokio::runtime::Handle::try_current().is_err()
        {
            return Err(ServerError::Config(
                "enforced expiry needs a tokio runtime for the sweeper".to_string(),
            ));
        }

        let service = DocumentService::new(env, config.store);
        let sweeper = ExpirySweeper::for_policy(&service, config.expiry);

        tracing::info!(
            lock_duration = ?config.store.lock_duration,
            expiry = ?config.expiry,
            "document store started"
        );

        Ok(Self { service, sweeper, config })
    }

    /// Handle for callers. Cheap to clone.
    pub fn service(&self) -> &DocumentService<E> {
        &self.service
    }

    /// Active configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Whether a sweeper is enforcing lock expiry.
    pub fn enforces_expiry(&self) -> bool {
        self.sweeper.as_ref().is_some_and(ExpirySweeper::is_running)
    }

    /// Stop background tasks. Outstanding service handles keep working.
    pub fn shutdown(self) {
        if let Some(sweeper) = self.sweeper {
            sweeper.shutdown();
        }
        tracing::info!("document store stopped");
    }
}
