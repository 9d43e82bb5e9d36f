//! Document types exchanged with clients.
//!
//! All types derive serde traits so a transport can marshal them without
//! wrapper types.

use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};

/// Opaque proof of lock ownership.
///
/// Minted by the store when a lock is acquired. Clients echo it back on save
/// or release; any string is accepted as input, unknown values simply fail to
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockToken(String);

impl LockToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LockToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for LockToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// A document that no lock currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedDocument {
    /// Stable document identity
    pub key: String,
    /// Human-readable title
    pub title: String,
    /// Document body
    pub contents: String,
}

impl UnlockedDocument {
    /// Create an unlocked document.
    pub fn new(key: impl Into<String>, title: impl Into<String>, contents: impl Into<String>) -> Self {
        Self { key: key.into(), title: title.into(), contents: contents.into() }
    }

    /// Metadata entry describing this document.
    pub fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata { key: self.key.clone(), title: self.title.clone() }
    }
}

/// A document held under an exclusive lock.
///
/// Returned by `lock_document` and submitted back by the client on save or
/// release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedDocument {
    /// Token identifying the lock holder
    pub lock_token: LockToken,
    /// Instant after which the lock is considered stale
    pub expiry: SystemTime,
    /// Stable document identity
    pub key: String,
    /// Title at lock time, or the client's edited title
    pub title: String,
    /// Contents at lock time, or the client's edited contents
    pub contents: String,
}

impl LockedDocument {
    /// Replace title and contents, keeping the lock token and expiry.
    ///
    /// Convenience for clients preparing a save.
    #[must_use]
    pub fn edited(mut self, title: impl Into<String>, contents: impl Into<String>) -> Self {
        self.title = title.into();
        self.contents = contents.into();
        self
    }

    /// Whether the lock is stale at `now`.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expiry <= now
    }

    /// Drop the lock fields, keeping key, title and contents.
    pub fn into_unlocked(self) -> UnlockedDocument {
        UnlockedDocument { key: self.key, title: self.title, contents: self.contents }
    }
}

/// Entry in the document picker listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Stable document identity
    pub key: String,
    /// Title recorded when the key was first registered
    pub title: String,
}
