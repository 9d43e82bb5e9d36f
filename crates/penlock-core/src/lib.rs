//! Penlock core: a lease-based document locking store.
//!
//! Clients collaboratively edit named documents. A document is either
//! unlocked (readable, lockable) or locked by exactly one lock token. Edits
//! are committed by saving under the token, or abandoned by releasing it.
//!
//! ## Architecture
//!
//! ```text
//! penlock-core
//!   ├─ Environment     (time + randomness abstraction)
//!   ├─ document        (UnlockedDocument, LockedDocument, DocumentMetadata)
//!   ├─ StoreError      (LockUnavailable, LockExpired)
//!   └─ DocumentStore   (sans-IO state machine over both document sets)
//! ```
//!
//! The store performs no I/O and no locking of its own. Callers that share
//! it between tasks wrap it in a mutex so every operation is one atomic
//! transaction (see `penlock-server`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
pub mod env;
pub mod error;
pub mod store;

pub use document::{DocumentMetadata, LockToken, LockedDocument, UnlockedDocument};
pub use env::Environment;
pub use error::{ExpiredReason, StoreError, UnavailableReason};
pub use store::{DEFAULT_LOCK_DURATION, DocumentStore, StoreConfig, StoreSnapshot};
