//! Model world - the model store plus everything a client remembers.
//!
//! The world owns the model clock and the tokens each key has been locked
//! under, so `TokenChoice` can be resolved the same way the real-world
//! wrapper resolves it.

use std::collections::HashMap;

use penlock_core::{DocumentMetadata, LockToken, StoreSnapshot, UnlockedDocument};

use super::{
    operation::{Operation, OperationResult, document_key, resolve_token},
    store::{ModelStore, into_result},
};

/// Observable state for oracle comparison.
///
/// Everything but lock tokens and expiry instants, which differ between
/// implementations by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Unlocked documents sorted by key.
    pub unlocked: Vec<UnlockedDocument>,
    /// Locked documents as captured at lock time, sorted by key.
    pub locked: Vec<UnlockedDocument>,
    /// Metadata listing, newest first.
    pub metadata: Vec<DocumentMetadata>,
}

impl ObservableState {
    /// Project a real store snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            unlocked: snapshot.unlocked,
            locked: snapshot.locked.into_iter().map(|doc| doc.into_unlocked()).collect(),
            metadata: snapshot.metadata,
        }
    }
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    store: ModelStore,
    now_ms: u64,
    /// Tokens issued per key, oldest first
    issued: HashMap<String, Vec<LockToken>>,
}

impl ModelWorld {
    /// Create a model world whose locks last `lock_ms` milliseconds.
    pub fn new(lock_ms: u64) -> Self {
        Self { store: ModelStore::new(lock_ms), now_ms: 0, issued: HashMap::new() }
    }

    /// The model store.
    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Model time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Apply an operation and return the result.
    ///
    /// This is the main entry point for model-based testing.
    /// The result should match the real implementation's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match *op {
            Operation::List => OperationResult::Listing(self.store.list()),
            Operation::Lock { key } => {
                let key = document_key(key);
                let result = self.store.lock(&key, self.now_ms);
                into_result(result, |(doc, token)| {
                    self.issued.entry(key).or_default().push(token);
                    OperationResult::Document(Some(doc))
                })
            },
            Operation::Get { key } => OperationResult::Document(self.store.get(&document_key(key))),
            Operation::Save { key, token, title, contents } => {
                let key = document_key(key);
                let token = resolve_token(self.issued_for(&key), token);
                let doc = UnlockedDocument::new(key, title.to_text(), contents.to_text());
                into_result(self.store.save(doc, &token), |doc| {
                    OperationResult::Document(Some(doc))
                })
            },
            Operation::Release { key, token, .. } => {
                let key = document_key(key);
                let token = resolve_token(self.issued_for(&key), token);
                into_result(self.store.release(&key, &token), |()| OperationResult::Ok)
            },
            Operation::Insert { key, title, contents } => {
                let doc = UnlockedDocument::new(document_key(key), title.to_text(), contents.to_text());
                into_result(self.store.insert(doc), |()| OperationResult::Ok)
            },
            Operation::AdvanceTime { secs } => {
                self.now_ms += u64::from(secs) * 1_000;
                OperationResult::Ok
            },
            Operation::EvictExpired => OperationResult::Evicted(self.store.evict(self.now_ms)),
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            unlocked: self.store.unlocked_sorted(),
            locked: self.store.locked_sorted(),
            metadata: self.store.list(),
        }
    }

    fn issued_for(&self, key: &str) -> &[LockToken] {
        self.issued.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OperationError, SmallText, TokenChoice};

    #[test]
    fn forged_token_cannot_save_locked_document() {
        let mut world = ModelWorld::new(600_000);
        let text = SmallText { seed: 1 };

        world.apply(&Operation::Insert { key: 0, title: text, contents: text });
        world.apply(&Operation::Lock { key: 0 });

        let result = world.apply(&Operation::Save {
            key: 0,
            token: TokenChoice::Forged,
            title: text,
            contents: text,
        });

        assert_eq!(result, OperationResult::Error(OperationError::InvalidLockId));
    }

    #[test]
    fn advance_time_moves_clock() {
        let mut world = ModelWorld::new(600_000);
        world.apply(&Operation::AdvanceTime { secs: 3 });
        assert_eq!(world.now_ms(), 3_000);
    }
}
