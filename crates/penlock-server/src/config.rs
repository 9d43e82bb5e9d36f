//! Server configuration.
//!
//! Lock expiry is advisory unless the server is told to enforce it. With
//! enforcement, a background sweeper evicts stale locks on a fixed interval.

use std::time::Duration;

use penlock_core::StoreConfig;

use crate::error::ServerError;

/// Longest lock lifetime the server accepts.
pub const MAX_LOCK_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How the server treats lock expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Expiry is informational only. Stale locks stay held until saved or
    /// released.
    #[default]
    Advisory,

    /// A sweeper evicts stale locks back to unlocked.
    Enforced {
        /// Time between sweeps
        sweep_interval: Duration,
    },
}

/// Configuration for a hosted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerConfig {
    /// Store configuration (lock lifetime)
    pub store: StoreConfig,
    /// Expiry handling
    pub expiry: ExpiryPolicy,
}

impl ServerConfig {
    /// Check the configuration for values the store cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` for a zero or oversized lock duration,
    /// or a zero sweep interval.
    pub fn validate(&self) -> Result<(), ServerError> {
        let lock_duration = self.store.lock_duration;
        if lock_duration.is_zero() {
            return Err(ServerError::Config("lock duration must be non-zero".to_string()));
        }
        if lock_duration > MAX_LOCK_DURATION {
            return Err(ServerError::Config(format!(
                "lock duration {:?} exceeds maximum {:?}",
                lock_duration, MAX_LOCK_DURATION
            )));
        }

        if let ExpiryPolicy::Enforced { sweep_interval } = self.expiry
            && sweep_interval.is_zero()
        {
            return Err(ServerError::Config("sweep interval must be non-zero".to_string()));
        }

        Ok(())
    }
}
