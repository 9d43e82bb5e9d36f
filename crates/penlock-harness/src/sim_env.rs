//! Simulated environment with a virtual clock and seeded RNG.
//!
//! Time only moves when a test calls `advance` or when a driver sleeps.
//! Sleeping waits on tokio's timer for the same duration, so under a paused
//! tokio clock (`#[tokio::test(start_paused = true)]`) sweeps happen in a
//! deterministic order.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime},
};

use penlock_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall-clock instant the virtual clock starts at.
const ORIGIN_SECS: u64 = 1_700_000_000;

/// Deterministic environment for simulations.
#[derive(Clone)]
pub struct SimEnv {
    seed: u64,
    /// Milliseconds since the origin
    elapsed_ms: Arc<AtomicU64>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Create an environment whose RNG is seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            elapsed_ms: Arc::new(AtomicU64::new(0)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Seed the RNG was created from. Log it to reproduce a failure.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, duration: Duration) {
        self.elapsed_ms.fetch_add(duration_ms(duration), Ordering::SeqCst);
    }

    /// Virtual time elapsed since the origin.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }

    /// Wall-clock instant the virtual clock started at.
    pub fn origin() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(ORIGIN_SECS)
    }
}

impl Environment for SimEnv {
    fn now(&self) -> SystemTime {
        Self::origin() + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        let elapsed_ms = Arc::clone(&self.elapsed_ms);
        async move {
            tokio::time::sleep(duration).await;
            elapsed_ms.fetch_add(duration_ms(duration), Ordering::SeqCst);
        }
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("seed", &self.seed).field("elapsed", &self.elapsed()).finish()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
