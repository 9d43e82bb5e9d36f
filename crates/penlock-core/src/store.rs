//! Document Store
//!
//! Tracks every document in exactly one of two sets and moves documents
//! between them under lock tokens.
//!
//! ## State machine (per key)
//!
//! ```text
//!            lock_document
//!   Unlocked ────────────────► Locked
//!      ▲  ◄──────────────────────┘
//!      │   save_document (token match)
//!      │   release_lock  (token match)
//!      │   evict_expired (expiry passed)
//!      │
//!   save_document / insert_document on a never-seen key
//! ```
//!
//! ## Design
//!
//! - Sans-IO: no locking, no I/O. The owner serializes access.
//! - Keyed maps: direct lookup by document key.
//! - Metadata is registered once per key and never refreshed, so the listing
//!   shows the title a document was first saved under.
//! - Release restores the contents captured at lock time.
//! - Expiry is advisory. Only `evict_expired` acts on it, and only when the
//!   owner chooses to call it.

use std::{
    collections::{HashMap, hash_map::Entry},
    time::Duration,
};

use crate::{
    document::{DocumentMetadata, LockToken, LockedDocument, UnlockedDocument},
    env::Environment,
    error::{ExpiredReason, StoreError, UnavailableReason},
};

/// Lock lifetime used when none is configured.
pub const DEFAULT_LOCK_DURATION: Duration = Duration::from_secs(10 * 60);

/// Store configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// How long after acquisition a lock is considered stale
    pub lock_duration: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { lock_duration: DEFAULT_LOCK_DURATION }
    }
}

/// Point-in-time copy of the whole store, in deterministic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Unlocked documents sorted by key
    pub unlocked: Vec<UnlockedDocument>,
    /// Locked documents sorted by key
    pub locked: Vec<LockedDocument>,
    /// Metadata in listing order (newest first)
    pub metadata: Vec<DocumentMetadata>,
}

/// In-memory registry of unlocked and locked documents.
pub struct DocumentStore<E>
where
    E: Environment,
{
    env: E,
    config: StoreConfig,
    unlocked: HashMap<String, UnlockedDocument>,
    locked: HashMap<String, LockedDocument>,
    /// Registration order, oldest first
    metadata: Vec<DocumentMetadata>,
    /// Next lock sequence number
    next_sequence: u64,
}

impl<E> DocumentStore<E>
where
    E: Environment,
{
    /// Create an empty store with the default lock duration.
    pub fn new(env: E) -> Self {
        Self::with_config(env, StoreConfig::default())
    }

    /// Create an empty store.
    pub fn with_config(env: E, config: StoreConfig) -> Self {
        Self {
            env,
            config,
            unlocked: HashMap::new(),
            locked: HashMap::new(),
            metadata: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Environment the store reads time and randomness from.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Metadata for every registered document, newest registration first.
    pub fn list_documents(&self) -> Vec<DocumentMetadata> {
        self.metadata.iter().rev().cloned().collect()
    }

    /// Acquire the exclusive lock on an unlocked document.
    ///
    /// The returned document carries the new lock token; the caller must
    /// present it to save or release.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockUnavailable` if the key is unknown or already
    /// locked, or if the lock duration pushes the expiry past the clock's
    /// range.
    pub fn lock_document(&mut self, key: &str) -> Result<LockedDocument, StoreError> {
        let held = match self.unlocked.entry(key.to_string()) {
            Entry::Occupied(held) => held,
            Entry::Vacant(_) => {
                let reason = if self.locked.contains_key(key) {
                    UnavailableReason::AlreadyLocked
                } else {
                    UnavailableReason::NotFound
                };
                tracing::debug!(key, %reason, "lock unavailable");
                return Err(StoreError::LockUnavailable { key: key.to_string(), reason });
            },
        };

        // Checked before the document leaves the unlocked set
        let Some(expiry) = self.env.now().checked_add(self.config.lock_duration) else {
            tracing::warn!(key, lock_duration = ?self.config.lock_duration, "lock expiry overflows");
            return Err(StoreError::LockUnavailable {
                key: key.to_string(),
                reason: UnavailableReason::ExpiryOverflow,
            });
        };
        let doc = held.remove();

        let lock_token = self.mint_token();
        let locked = LockedDocument {
            lock_token,
            expiry,
            key: doc.key,
            title: doc.title,
            contents: doc.contents,
        };
        self.locked.insert(locked.key.clone(), locked.clone());

        tracing::debug!(key, token = %locked.lock_token, "document locked");
        Ok(locked)
    }

    /// Read the last saved version of an unlocked document.
    ///
    /// Returns `None` for unknown keys and for documents currently locked.
    pub fn get_document(&self, key: &str) -> Option<UnlockedDocument> {
        self.unlocked.get(key).cloned()
    }

    /// Commit a locked document's edits and unlock it.
    ///
    /// A key that is neither locked nor unlocked is registered as a new
    /// document; no token check applies to it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockExpired` if the document is already unlocked
    /// or is locked under a different token.
    pub fn save_document(&mut self, doc: LockedDocument) -> Result<UnlockedDocument, StoreError> {
        let LockedDocument { lock_token, key, title, contents, .. } = doc;

        if self.unlocked.contains_key(&key) {
            tracing::warn!(key = %key, "save rejected: document is unlocked");
            return Err(StoreError::LockExpired { key, reason: ExpiredReason::DocumentUnlocked });
        }

        let saved = UnlockedDocument { key, title, contents };

        match self.locked.entry(saved.key.clone()) {
            Entry::Occupied(held) if held.get().lock_token != lock_token => {
                tracing::warn!(key = %saved.key, "save rejected: invalid lock id");
                return Err(StoreError::LockExpired {
                    key: saved.key,
                    reason: ExpiredReason::InvalidLockId,
                });
            },
            Entry::Occupied(held) => {
                held.remove();
                tracing::debug!(key = %saved.key, "document saved");
            },
            Entry::Vacant(_) => {
                self.metadata.push(saved.metadata());
                tracing::info!(key = %saved.key, title = %saved.title, "document created");
            },
        }

        self.unlocked.insert(saved.key.clone(), saved.clone());
        Ok(saved)
    }

    /// Abandon a lock, restoring the document as it was when locked.
    ///
    /// Title and contents in `doc` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockExpired` if the document is not locked or is
    /// locked under a different token.
    pub fn release_lock(&mut self, doc: &LockedDocument) -> Result<(), StoreError> {
        let held = match self.locked.entry(doc.key.clone()) {
            Entry::Vacant(_) => {
                tracing::warn!(key = %doc.key, "release rejected: document not locked");
                return Err(StoreError::LockExpired {
                    key: doc.key.clone(),
                    reason: ExpiredReason::NotLocked,
                });
            },
            Entry::Occupied(held) if held.get().lock_token != doc.lock_token => {
                tracing::warn!(key = %doc.key, "release rejected: invalid lock id");
                return Err(StoreError::LockExpired {
                    key: doc.key.clone(),
                    reason: ExpiredReason::InvalidLockId,
                });
            },
            Entry::Occupied(held) => held.remove(),
        };

        tracing::debug!(key = %doc.key, "lock released");
        self.unlocked.insert(held.key.clone(), held.into_unlocked());
        Ok(())
    }

    /// Register a new unlocked document.
    ///
    /// Used to seed the store. Records metadata like a first save would.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DocumentExists` if the key is already registered.
    pub fn insert_document(&mut self, doc: UnlockedDocument) -> Result<(), StoreError> {
        if self.unlocked.contains_key(&doc.key) || self.locked.contains_key(&doc.key) {
            return Err(StoreError::DocumentExists { key: doc.key });
        }

        self.metadata.push(doc.metadata());
        self.unlocked.insert(doc.key.clone(), doc);
        Ok(())
    }

    /// Move every lock whose expiry has passed back to the unlocked set.
    ///
    /// Evicted documents keep the contents captured at lock time. Later
    /// save or release calls with the evicted token fail with
    /// `LockExpired`. Returns the evicted keys, sorted.
    pub fn evict_expired(&mut self) -> Vec<String> {
        let now = self.env.now();
        let mut evicted: Vec<String> = Vec::new();

        for (key, held) in self.locked.extract_if(|_, held| held.is_expired_at(now)) {
            tracing::info!(key = %key, token = %held.lock_token, "evicting expired lock");
            self.unlocked.insert(key.clone(), held.into_unlocked());
            evicted.push(key);
        }

        evicted.sort();
        evicted
    }

    /// Whether the key is currently locked.
    pub fn is_locked(&self, key: &str) -> bool {
        self.locked.contains_key(key)
    }

    /// Expiry of the lock currently held on `key`.
    pub fn lock_expiry(&self, key: &str) -> Option<std::time::SystemTime> {
        self.locked.get(key).map(|held| held.expiry)
    }

    /// Number of registered documents, locked or not.
    pub fn document_count(&self) -> usize {
        self.unlocked.len() + self.locked.len()
    }

    /// Number of documents currently locked.
    pub fn locked_count(&self) -> usize {
        self.locked.len()
    }

    /// Copy of the full store state.
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut unlocked: Vec<_> = self.unlocked.values().cloned().collect();
        unlocked.sort_by(|a, b| a.key.cmp(&b.key));

        let mut locked: Vec<_> = self.locked.values().cloned().collect();
        locked.sort_by(|a, b| a.key.cmp(&b.key));

        StoreSnapshot { unlocked, locked, metadata: self.list_documents() }
    }

    /// Mint a lock token unique for the lifetime of this store.
    ///
    /// The sequence number guarantees uniqueness; the nonce makes tokens
    /// unguessable.
    fn mint_token(&mut self) -> LockToken {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        LockToken::new(format!("{sequence:x}-{:016x}", self.env.random_u64()))
    }
}

impl<E> std::fmt::Debug for DocumentStore<E>
where
    E: Environment,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("unlocked_count", &self.unlocked.len())
            .field("locked_count", &self.locked.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::SystemTime,
    };

    use super::*;

    /// Clock that only moves when told to; RNG is a counter.
    #[derive(Clone)]
    struct ManualEnv {
        secs: Arc<AtomicU64>,
        counter: Arc<AtomicU64>,
    }

    impl ManualEnv {
        fn new() -> Self {
            Self { secs: Arc::new(AtomicU64::new(1_000)), counter: Arc::new(AtomicU64::new(0)) }
        }

        fn advance(&self, secs: u64) {
            self.secs.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Environment for ManualEnv {
        fn now(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH + Duration::from_secs(self.secs.load(Ordering::SeqCst))
        }

        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            self.advance(duration.as_secs());
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let value = self.counter.fetch_add(1, Ordering::SeqCst).to_be_bytes();
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = value[i % value.len()];
            }
        }
    }

    fn seeded_store() -> (DocumentStore<ManualEnv>, ManualEnv) {
        let env = ManualEnv::new();
        let mut store = DocumentStore::new(env.clone());
        store.insert_document(UnlockedDocument::new("a", "Doc A", "v1")).unwrap();
        (store, env)
    }

    #[test]
    fn lock_sets_expiry_from_config() {
        let env = ManualEnv::new();
        let config = StoreConfig { lock_duration: Duration::from_secs(30) };
        let mut store = DocumentStore::with_config(env.clone(), config);
        store.insert_document(UnlockedDocument::new("a", "Doc A", "v1")).unwrap();

        let locked = store.lock_document("a").unwrap();

        assert_eq!(locked.expiry, env.now() + Duration::from_secs(30));
        assert_eq!(store.lock_expiry("a"), Some(locked.expiry));
    }

    #[test]
    fn default_lock_lasts_ten_minutes() {
        let (mut store, env) = seeded_store();
        let locked = store.lock_document("a").unwrap();
        assert_eq!(locked.expiry, env.now() + Duration::from_secs(600));
    }

    #[test]
    fn tokens_carry_increasing_sequence() {
        let (mut store, _env) = seeded_store();

        let first = store.lock_document("a").unwrap();
        store.release_lock(&first).unwrap();
        let second = store.lock_document("a").unwrap();

        assert!(first.lock_token.as_str().starts_with("0-"));
        assert!(second.lock_token.as_str().starts_with("1-"));
        assert_ne!(first.lock_token, second.lock_token);
    }

    #[test]
    fn failed_lock_does_not_consume_sequence() {
        let (mut store, _env) = seeded_store();

        assert!(store.lock_document("missing").is_err());
        let locked = store.lock_document("a").unwrap();

        assert!(locked.lock_token.as_str().starts_with("0-"));
    }

    #[test]
    fn lock_distinguishes_missing_and_held() {
        let (mut store, _env) = seeded_store();
        store.lock_document("a").unwrap();

        assert_eq!(
            store.lock_document("a"),
            Err(StoreError::LockUnavailable {
                key: "a".to_string(),
                reason: UnavailableReason::AlreadyLocked
            })
        );
        assert_eq!(
            store.lock_document("zzz"),
            Err(StoreError::LockUnavailable {
                key: "zzz".to_string(),
                reason: UnavailableReason::NotFound
            })
        );
    }

    #[test]
    fn overflowing_lock_duration_keeps_document_unlocked() {
        let env = ManualEnv::new();
        let config = StoreConfig { lock_duration: Duration::MAX };
        let mut store = DocumentStore::with_config(env, config);
        store.insert_document(UnlockedDocument::new("a", "Doc A", "v1")).unwrap();

        assert_eq!(
            store.lock_document("a"),
            Err(StoreError::LockUnavailable {
                key: "a".to_string(),
                reason: UnavailableReason::ExpiryOverflow
            })
        );
        assert!(!store.is_locked("a"));
        assert_eq!(store.get_document("a"), Some(UnlockedDocument::new("a", "Doc A", "v1")));
        assert_eq!(store.document_count(), 1);
    }

    #[test]
    fn expiry_is_advisory_without_eviction() {
        let (mut store, env) = seeded_store();
        let locked = store.lock_document("a").unwrap();

        env.advance(3_600);

        let saved = store.save_document(locked.edited("Doc A", "late")).unwrap();
        assert_eq!(saved.contents, "late");
    }

    #[test]
    fn evict_expired_only_touches_stale_locks() {
        let env = ManualEnv::new();
        let mut store = DocumentStore::new(env.clone());
        store.insert_document(UnlockedDocument::new("a", "Doc A", "v1")).unwrap();
        store.insert_document(UnlockedDocument::new("b", "Doc B", "v1")).unwrap();

        store.lock_document("a").unwrap();
        env.advance(300);
        store.lock_document("b").unwrap();
        env.advance(300);

        assert_eq!(store.evict_expired(), vec!["a".to_string()]);
        assert!(!store.is_locked("a"));
        assert!(store.is_locked("b"));
        assert_eq!(store.get_document("a"), Some(UnlockedDocument::new("a", "Doc A", "v1")));
    }

    #[test]
    fn evicted_lock_cannot_save_or_release() {
        let (mut store, env) = seeded_store();
        let locked = store.lock_document("a").unwrap();

        env.advance(601);
        store.evict_expired();

        assert_eq!(
            store.save_document(locked.clone().edited("Doc A", "v2")),
            Err(StoreError::LockExpired {
                key: "a".to_string(),
                reason: ExpiredReason::DocumentUnlocked
            })
        );
        assert_eq!(
            store.release_lock(&locked),
            Err(StoreError::LockExpired { key: "a".to_string(), reason: ExpiredReason::NotLocked })
        );
    }

    #[test]
    fn insert_rejects_locked_key() {
        let (mut store, _env) = seeded_store();
        store.lock_document("a").unwrap();

        let result = store.insert_document(UnlockedDocument::new("a", "Other", "x"));

        assert_eq!(result, Err(StoreError::DocumentExists { key: "a".to_string() }));
        assert_eq!(store.list_documents().len(), 1);
    }

    #[test]
    fn snapshot_is_sorted() {
        let env = ManualEnv::new();
        let mut store = DocumentStore::new(env);
        for key in ["c", "a", "b"] {
            store.insert_document(UnlockedDocument::new(key, key, "")).unwrap();
        }
        store.lock_document("b").unwrap();

        let snapshot = store.snapshot();
        let unlocked: Vec<_> = snapshot.unlocked.iter().map(|d| d.key.as_str()).collect();
        let metadata: Vec<_> = snapshot.metadata.iter().map(|m| m.key.as_str()).collect();

        assert_eq!(unlocked, ["a", "c"]);
        assert_eq!(snapshot.locked.len(), 1);
        assert_eq!(metadata, ["b", "a", "c"]);
        assert_eq!(store.document_count(), 3);
        assert_eq!(store.locked_count(), 1);
    }
}
