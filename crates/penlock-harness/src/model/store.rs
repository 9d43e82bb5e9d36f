//! Model document store.
//!
//! Lists instead of maps, linear scans, newest entries at the front. Time is
//! a plain millisecond counter supplied by the caller.

use penlock_core::{DocumentMetadata, LockToken, UnlockedDocument};

use super::operation::{OperationError, OperationResult};

/// A held lock in the model.
#[derive(Debug, Clone)]
struct ModelLock {
    token: LockToken,
    expires_at_ms: u64,
    /// Document as it was when locked.
    doc: UnlockedDocument,
}

/// Reference implementation of the document store.
#[derive(Debug, Clone)]
pub struct ModelStore {
    unlocked: Vec<UnlockedDocument>,
    locked: Vec<ModelLock>,
    /// Newest first
    metadata: Vec<DocumentMetadata>,
    lock_ms: u64,
    next_token: u64,
}

impl ModelStore {
    /// Create an empty model whose locks last `lock_ms` milliseconds.
    pub fn new(lock_ms: u64) -> Self {
        Self { unlocked: Vec::new(), locked: Vec::new(), metadata: Vec::new(), lock_ms, next_token: 0 }
    }

    /// Metadata listing.
    pub fn list(&self) -> Vec<DocumentMetadata> {
        self.metadata.clone()
    }

    /// Acquire a lock. Returns the document and the minted token.
    pub fn lock(
        &mut self,
        key: &str,
        now_ms: u64,
    ) -> Result<(UnlockedDocument, LockToken), OperationError> {
        let Some(pos) = self.unlocked.iter().position(|d| d.key == key) else {
            return Err(if self.locked.iter().any(|l| l.doc.key == key) {
                OperationError::AlreadyLocked
            } else {
                OperationError::NotFound
            });
        };

        let doc = self.unlocked.remove(pos);
        let token = LockToken::new(format!("m{}", self.next_token));
        self.next_token += 1;

        self.locked.insert(
            0,
            ModelLock { token: token.clone(), expires_at_ms: now_ms + self.lock_ms, doc: doc.clone() },
        );
        Ok((doc, token))
    }

    /// Read an unlocked document.
    pub fn get(&self, key: &str) -> Option<UnlockedDocument> {
        self.unlocked.iter().find(|d| d.key == key).cloned()
    }

    /// Save a document under `token`.
    pub fn save(
        &mut self,
        doc: UnlockedDocument,
        token: &LockToken,
    ) -> Result<UnlockedDocument, OperationError> {
        if self.unlocked.iter().any(|d| d.key == doc.key) {
            return Err(OperationError::DocumentUnlocked);
        }

        match self.locked.iter().position(|l| l.doc.key == doc.key) {
            Some(pos) => {
                if &self.locked[pos].token != token {
                    return Err(OperationError::InvalidLockId);
                }
                self.locked.remove(pos);
            },
            None => self.metadata.insert(0, doc.metadata()),
        }

        self.unlocked.insert(0, doc.clone());
        Ok(doc)
    }

    /// Release the lock on `key` held by `token`.
    pub fn release(&mut self, key: &str, token: &LockToken) -> Result<(), OperationError> {
        let pos = self
            .locked
            .iter()
            .position(|l| l.doc.key == key)
            .ok_or(OperationError::NotLocked)?;

        if &self.locked[pos].token != token {
            return Err(OperationError::InvalidLockId);
        }

        let held = self.locked.remove(pos);
        self.unlocked.insert(0, held.doc);
        Ok(())
    }

    /// Seed a document.
    pub fn insert(&mut self, doc: UnlockedDocument) -> Result<(), OperationError> {
        let known = self.unlocked.iter().any(|d| d.key == doc.key)
            || self.locked.iter().any(|l| l.doc.key == doc.key);
        if known {
            return Err(OperationError::DocumentExists);
        }

        self.metadata.insert(0, doc.metadata());
        self.unlocked.insert(0, doc);
        Ok(())
    }

    /// Evict every lock expired at `now_ms`. Returns sorted keys.
    pub fn evict(&mut self, now_ms: u64) -> Vec<String> {
        let mut evicted = Vec::new();
        let mut kept = Vec::new();

        for held in self.locked.drain(..) {
            if held.expires_at_ms <= now_ms {
                evicted.push(held.doc.key.clone());
                self.unlocked.insert(0, held.doc);
            } else {
                kept.push(held);
            }
        }

        self.locked = kept;
        evicted.sort();
        evicted
    }

    /// Unlocked documents sorted by key.
    pub fn unlocked_sorted(&self) -> Vec<UnlockedDocument> {
        let mut docs = self.unlocked.clone();
        docs.sort_by(|a, b| a.key.cmp(&b.key));
        docs
    }

    /// Lock snapshots sorted by key.
    pub fn locked_sorted(&self) -> Vec<UnlockedDocument> {
        let mut docs: Vec<_> = self.locked.iter().map(|l| l.doc.clone()).collect();
        docs.sort_by(|a, b| a.key.cmp(&b.key));
        docs
    }
}

/// Wrap a model call result.
pub(crate) fn into_result<T>(
    result: Result<T, OperationError>,
    f: impl FnOnce(T) -> OperationResult,
) -> OperationResult {
    match result {
        Ok(value) => f(value),
        Err(e) => OperationResult::Error(e),
    }
}
