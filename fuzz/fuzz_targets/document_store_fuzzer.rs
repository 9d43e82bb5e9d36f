//! Fuzz target for [`DocumentStore`] lock bookkeeping
//!
//! Drive the real store and the reference model with the same arbitrary
//! operation sequence and require identical behavior.
//!
//! # Strategy
//!
//! - Operation sequences: locks, saves and releases over a tiny key space so
//!   they collide constantly
//! - Token choice: latest, superseded and forged tokens
//! - Time: arbitrary clock jumps followed by explicit sweeps
//!
//! # Invariants
//!
//! - Results and observable state match the model after every operation
//! - A key is never both locked and unlocked
//! - Every registered key has exactly one metadata entry
//! - A locked document is never readable
//! - Tokens minted by the store are never reused
//! - NEVER panic on any operation sequence

#![no_main]

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use penlock_core::{
    DocumentStore, LockToken, LockedDocument, StoreConfig, StoreError, UnlockedDocument,
};
use penlock_harness::{
    model::operation::{document_key, resolve_token},
    ModelWorld, ObservableState, Operation, OperationError, OperationResult, SimEnv, TokenChoice,
};

const LOCK_SECS: u64 = 60;

/// Fuzz input with a deterministic seed for the token RNG.
#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    seed: u64,
    ops: Vec<Operation>,
}

struct Target {
    store: DocumentStore<SimEnv>,
    env: SimEnv,
    issued: HashMap<String, Vec<LockToken>>,
    minted: HashSet<LockToken>,
}

impl Target {
    fn new(seed: u64) -> Self {
        let env = SimEnv::with_seed(seed);
        let config = StoreConfig { lock_duration: Duration::from_secs(LOCK_SECS) };
        Self {
            store: DocumentStore::with_config(env.clone(), config),
            env,
            issued: HashMap::new(),
            minted: HashSet::new(),
        }
    }

    fn submitted(&self, key: String, choice: TokenChoice) -> LockedDocument {
        let issued = self.issued.get(&key).map(Vec::as_slice).unwrap_or_default();
        LockedDocument {
            lock_token: resolve_token(issued, choice),
            expiry: self.store.lock_expiry(&key).unwrap_or_else(SimEnv::origin),
            key,
            title: String::new(),
            contents: String::new(),
        }
    }

    fn apply(&mut self, op: &Operation) -> OperationResult {
        let outcome = |r: Result<OperationResult, StoreError>| match r {
            Ok(result) => result,
            Err(e) => OperationResult::Error(OperationError::from(&e)),
        };

        match *op {
            Operation::List => OperationResult::Listing(self.store.list_documents()),
            Operation::Lock { key } => {
                let key = document_key(key);
                outcome(self.store.lock_document(&key).map(|locked| {
                    assert!(
                        self.minted.insert(locked.lock_token.clone()),
                        "token reused: {}",
                        locked.lock_token
                    );
                    self.issued.entry(key).or_default().push(locked.lock_token.clone());
                    OperationResult::Document(Some(locked.into_unlocked()))
                }))
            },
            Operation::Get { key } => {
                OperationResult::Document(self.store.get_document(&document_key(key)))
            },
            Operation::Save { key, token, title, contents } => {
                let doc = self
                    .submitted(document_key(key), token)
                    .edited(title.to_text(), contents.to_text());
                let saved = self.store.save_document(doc);
                outcome(saved.map(|doc| OperationResult::Document(Some(doc))))
            },
            Operation::Release { key, token, contents } => {
                let doc = self
                    .submitted(document_key(key), token)
                    .edited(contents.to_text(), contents.to_text());
                outcome(self.store.release_lock(&doc).map(|()| OperationResult::Ok))
            },
            Operation::Insert { key, title, contents } => {
                let doc =
                    UnlockedDocument::new(document_key(key), title.to_text(), contents.to_text());
                outcome(self.store.insert_document(doc).map(|()| OperationResult::Ok))
            },
            Operation::AdvanceTime { secs } => {
                self.env.advance(Duration::from_secs(u64::from(secs)));
                OperationResult::Ok
            },
            Operation::EvictExpired => OperationResult::Evicted(self.store.evict_expired()),
        }
    }

    fn check_invariants(&self) {
        let snapshot = self.store.snapshot();

        for doc in &snapshot.locked {
            assert!(
                !snapshot.unlocked.iter().any(|u| u.key == doc.key),
                "{} is both locked and unlocked",
                doc.key
            );
            assert_eq!(
                self.store.get_document(&doc.key),
                None,
                "{} readable while locked",
                doc.key
            );
        }

        let mut keys: Vec<_> = snapshot.metadata.iter().map(|m| m.key.as_str()).collect();
        keys.sort_unstable();
        let mut registered: Vec<_> = snapshot
            .unlocked
            .iter()
            .map(|d| d.key.as_str())
            .chain(snapshot.locked.iter().map(|d| d.key.as_str()))
            .collect();
        registered.sort_unstable();
        assert_eq!(keys, registered, "metadata out of step with documents");
    }
}

fuzz_target!(|input: FuzzInput| {
    let mut model = ModelWorld::new(LOCK_SECS * 1_000);
    let mut target = Target::new(input.seed);

    for op in &input.ops {
        let expected = model.apply(op);
        let actual = target.apply(op);

        assert_eq!(expected, actual, "divergence at {op:?}");
        target.check_invariants();
        assert_eq!(
            model.observable_state(),
            ObservableState::from_snapshot(target.store.snapshot())
        );
    }
});
