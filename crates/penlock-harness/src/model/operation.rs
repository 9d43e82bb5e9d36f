//! Operations for model-based testing.
//!
//! Operations represent every call a client or driver can make against the
//! store. They are generated randomly by proptest (or decoded by the fuzzer)
//! and applied to both the model and the real implementation.

use arbitrary::Arbitrary;
use penlock_core::{
    DocumentMetadata, ExpiredReason, LockToken, StoreError, UnavailableReason, UnlockedDocument,
};

/// Document key (small space so operations collide often).
pub type ModelKey = u8;

/// Number of distinct keys operations can address.
pub const KEY_SPACE: u8 = 6;

/// Token literal no store ever mints.
pub const FORGED_TOKEN: &str = "forged";

/// Real document key for a model key.
pub fn document_key(key: ModelKey) -> String {
    format!("doc-{}", key % KEY_SPACE)
}

/// Which token a save or release presents.
///
/// Resolved against the tokens a world has seen issued for the key, so the
/// model and the real store pick corresponding tokens even though their
/// token values differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum TokenChoice {
    /// Most recently issued token for the key.
    Latest,
    /// The token issued before the latest one.
    Previous,
    /// A token that was never issued.
    Forged,
}

/// Small text content for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct SmallText {
    /// Text seed (expanded to a short string).
    pub seed: u8,
}

impl SmallText {
    /// Expand to the actual string.
    pub fn to_text(self) -> String {
        match self.seed % 4 {
            0 => String::new(),
            _ => format!("text-{}", self.seed),
        }
    }
}

/// Operations that can be applied to the store.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// List document metadata.
    List,

    /// Acquire a lock.
    Lock {
        /// Target document.
        key: ModelKey,
    },

    /// Read an unlocked document.
    Get {
        /// Target document.
        key: ModelKey,
    },

    /// Save under a lock (or create a new document).
    Save {
        /// Target document.
        key: ModelKey,
        /// Token to present.
        token: TokenChoice,
        /// New title.
        title: SmallText,
        /// New contents.
        contents: SmallText,
    },

    /// Release a lock.
    Release {
        /// Target document.
        key: ModelKey,
        /// Token to present.
        token: TokenChoice,
        /// Edits that must be discarded.
        contents: SmallText,
    },

    /// Seed a document.
    Insert {
        /// Target document.
        key: ModelKey,
        /// Title.
        title: SmallText,
        /// Contents.
        contents: SmallText,
    },

    /// Advance simulation time.
    AdvanceTime {
        /// Seconds to advance.
        secs: u16,
    },

    /// Run one expiry sweep.
    EvictExpired,
}

/// Result of applying an operation.
///
/// Used to compare model and real system behavior. Lock tokens are never
/// part of a result because the two implementations mint different values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded with nothing to report.
    Ok,

    /// Document returned by lock, get or save.
    Document(Option<UnlockedDocument>),

    /// Metadata listing.
    Listing(Vec<DocumentMetadata>),

    /// Keys evicted by a sweep.
    Evicted(Vec<String>),

    /// Operation failed with expected error.
    Error(OperationError),
}

/// Expected errors that can occur during operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Lock target does not exist.
    NotFound,

    /// Lock target is already locked.
    AlreadyLocked,

    /// Lock expiry does not fit the clock.
    ExpiryOverflow,

    /// Save of an unlocked document.
    DocumentUnlocked,

    /// Token does not match the held lock.
    InvalidLockId,

    /// Release of a document that is not locked.
    NotLocked,

    /// Insert of a registered key.
    DocumentExists,
}

impl From<&StoreError> for OperationError {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::LockUnavailable { reason: UnavailableReason::NotFound, .. } => {
                Self::NotFound
            },
            StoreError::LockUnavailable { reason: UnavailableReason::AlreadyLocked, .. } => {
                Self::AlreadyLocked
            },
            StoreError::LockUnavailable { reason: UnavailableReason::ExpiryOverflow, .. } => {
                Self::ExpiryOverflow
            },
            StoreError::LockExpired { reason: ExpiredReason::DocumentUnlocked, .. } => {
                Self::DocumentUnlocked
            },
            StoreError::LockExpired { reason: ExpiredReason::InvalidLockId, .. } => {
                Self::InvalidLockId
            },
            StoreError::LockExpired { reason: ExpiredReason::NotLocked, .. } => Self::NotLocked,
            StoreError::DocumentExists { .. } => Self::DocumentExists,
        }
    }
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        !self.is_err()
    }

    /// Check if operation failed.
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Pick the token a choice refers to, given the tokens issued for a key in
/// order.
pub fn resolve_token(issued: &[LockToken], choice: TokenChoice) -> LockToken {
    let picked = match choice {
        TokenChoice::Latest => issued.last(),
        TokenChoice::Previous => issued.len().checked_sub(2).and_then(|i| issued.get(i)),
        TokenChoice::Forged => None,
    };
    picked.cloned().unwrap_or_else(|| LockToken::from(FORGED_TOKEN))
}
