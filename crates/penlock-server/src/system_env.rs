//! Wall-clock environment for a hosted store.
//!
//! Lock expiries handed to clients are system clock instants. Token nonces
//! are drawn from OS entropy.

use std::time::{Duration, SystemTime};

use penlock_core::Environment;

/// Environment backed by the system clock and `getrandom`.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // Tokens stay unique through their sequence prefix even if the
            // nonce degrades to zeros.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}

#[cfg(test)]
mod tests {
    use penlock_core::{DocumentStore, StoreConfig, UnlockedDocument};

    use super::*;

    fn store() -> DocumentStore<SystemEnv> {
        let config = StoreConfig { lock_duration: Duration::from_secs(90) };
        let mut store = DocumentStore::with_config(SystemEnv::new(), config);
        store.insert_document(UnlockedDocument::new("a", "Doc A", "v1")).unwrap();
        store
    }

    /// Split a token into its sequence and nonce parts.
    fn parts(token: &str) -> (&str, &str) {
        token.split_once('-').unwrap()
    }

    #[test]
    fn tokens_carry_os_entropy_nonces() {
        let mut store = store();
        let mut nonces = Vec::new();

        for expected_sequence in ["0", "1", "2", "3"] {
            let locked = store.lock_document("a").unwrap();
            let (sequence, nonce) = parts(locked.lock_token.as_str());

            assert_eq!(sequence, expected_sequence);
            assert_eq!(nonce.len(), 16);
            assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));

            nonces.push(nonce.to_string());
            store.release_lock(&locked).unwrap();
        }

        nonces.sort();
        nonces.dedup();
        assert_eq!(nonces.len(), 4, "nonces must not repeat");
    }

    #[test]
    fn lock_expiry_follows_system_clock() {
        let mut store = store();

        let before = SystemTime::now();
        let locked = store.lock_document("a").unwrap();
        let after = SystemTime::now();

        assert!(locked.expiry >= before + Duration::from_secs(90));
        assert!(locked.expiry <= after + Duration::from_secs(90));
        assert!(!locked.is_expired_at(SystemTime::now()));
    }

    #[tokio::test]
    async fn sweeper_sleep_waits_in_real_time() {
        let env = SystemEnv::new();

        let start = std::time::Instant::now();
        env.sleep(Duration::from_millis(20)).await;

        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
