//! Server error types.

use std::fmt;

use penlock_core::StoreError;

/// Errors that can occur while hosting the store.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error
    Config(String),

    /// Seed documents could not be loaded
    Seed(String),

    /// I/O error
    Io(String),

    /// Store rejected an operation
    Store(StoreError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Seed(msg) => write!(f, "seed error: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Store(err) => write!(f, "store error: {}", err),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
