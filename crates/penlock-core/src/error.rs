//! Store error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a lock could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnavailableReason {
    /// No document with this key exists.
    NotFound,
    /// Another client holds the lock.
    AlreadyLocked,
    /// The configured lock duration puts the expiry past the clock's range.
    ExpiryOverflow,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("Item not found"),
            Self::AlreadyLocked => f.write_str("Document is locked"),
            Self::ExpiryOverflow => f.write_str("Lock expiry out of range"),
        }
    }
}

/// Why a save or release was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiredReason {
    /// The document was already saved or released by someone else.
    DocumentUnlocked,
    /// The document is locked under a different token.
    InvalidLockId,
    /// Release of a document that is not locked.
    NotLocked,
}

impl fmt::Display for ExpiredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentUnlocked => f.write_str("Document is unlocked"),
            Self::InvalidLockId => f.write_str("Invalid Lock ID"),
            Self::NotLocked => f.write_str("Document not locked"),
        }
    }
}

/// Errors from `DocumentStore` operations.
///
/// Every error leaves the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StoreError {
    /// The requested document cannot be locked right now.
    #[error("lock unavailable for {key:?}: {reason}")]
    LockUnavailable {
        /// Requested document key.
        key: String,
        /// Whether the document is missing, held, or unlockable.
        reason: UnavailableReason,
    },

    /// The caller's lock is no longer valid.
    #[error("lock expired for {key:?}: {reason}")]
    LockExpired {
        /// Document key from the submitted lock.
        key: String,
        /// Which validation failed.
        reason: ExpiredReason,
    },

    /// Seeding a key that is already registered.
    #[error("document already exists: {key:?}")]
    DocumentExists {
        /// The duplicate key.
        key: String,
    },
}

impl StoreError {
    /// Key of the document the failed operation targeted.
    pub fn key(&self) -> &str {
        match self {
            Self::LockUnavailable { key, .. }
            | Self::LockExpired { key, .. }
            | Self::DocumentExists { key } => key,
        }
    }

    /// Returns true if the caller must re-fetch the document and re-acquire a
    /// lock before its local edits can be saved.
    ///
    /// `LockUnavailable` only needs a later retry.
    pub fn requires_refetch(&self) -> bool {
        matches!(self, Self::LockExpired { .. })
    }
}
