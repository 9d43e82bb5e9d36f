//! Background eviction of expired locks.
//!
//! Only runs under `ExpiryPolicy::Enforced`. Each sweep takes the same store
//! mutex as client operations, so an eviction never interleaves with a save
//! or release.

use std::time::Duration;

use penlock_core::Environment;
use tokio::task::JoinHandle;

use crate::{config::ExpiryPolicy, service::DocumentService};

/// Handle to a running sweeper task.
#[derive(Debug)]
pub struct ExpirySweeper {
    handle: JoinHandle<()>,
    interval: Duration,
}

impl ExpirySweeper {
    /// Spawn a sweeper that evicts expired locks every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<E>(service: DocumentService<E>, interval: Duration) -> Self
    where
        E: Environment,
    {
        let env = service.env().clone();
        let handle = tokio::spawn(async move {
            loop {
                env.sleep(interval).await;

                let evicted = service.evict_expired().await;
                if !evicted.is_empty() {
                    tracing::info!(count = evicted.len(), keys = ?evicted, "evicted expired locks");
                }
            }
        });

        tracing::debug!(?interval, "expiry sweeper started");
        Self { handle, interval }
    }

    /// Spawn a sweeper if the policy enforces expiry.
    pub fn for_policy<E>(service: &DocumentService<E>, policy: ExpiryPolicy) -> Option<Self>
    where
        E: Environment,
    {
        match policy {
            ExpiryPolicy::Advisory => None,
            ExpiryPolicy::Enforced { sweep_interval } => {
                Some(Self::spawn(service.clone(), sweep_interval))
            },
        }
    }

    /// Time between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the sweeper task is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the sweeper. An in-flight sweep is cancelled at its next await.
    pub fn shutdown(self) {
        self.handle.abort();
        tracing::debug!("expiry sweeper stopped");
    }
}
