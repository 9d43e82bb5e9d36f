//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples store logic from system resources
//! (wall-clock time, randomness, sleeping). This enables:
//!
//! - Deterministic Simulation: a virtual clock and seeded RNG make lock
//!   expiry and token minting reproducible.
//!
//! - Production Runtime: system time and OS entropy without any change to the
//!   store logic.
//!
//! # Invariants
//!
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

use std::time::{Duration, SystemTime};

/// Abstract environment providing time, randomness, and async primitives.
///
/// Lock expiries are wall-clock instants because they travel to clients
/// alongside the locked document, so `now()` returns [`SystemTime`].
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current wall-clock time.
    ///
    /// Simulation implementations MUST never go backwards. Production
    /// implementations follow the system clock.
    fn now(&self) -> SystemTime;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait. Store logic never calls
    /// it; only drivers such as the expiry sweeper do.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Security
    ///
    /// Production implementations MUST use OS entropy (`getrandom`), since
    /// lock tokens embed these bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
