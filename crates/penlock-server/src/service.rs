//! Shared document service.
//!
//! `DocumentService` is the handle a transport calls into. Each method holds
//! the store mutex for its whole read-modify-write sequence, so every
//! operation is one atomic transaction over the unlocked set, the locked set
//! and the metadata index.

use std::sync::Arc;

use penlock_core::{
    DocumentMetadata, DocumentStore, Environment, LockedDocument, StoreConfig, StoreError,
    StoreSnapshot, UnlockedDocument,
};
use tokio::sync::Mutex;

/// Cloneable, thread-safe handle to a `DocumentStore`.
pub struct DocumentService<E>
where
    E: Environment,
{
    store: Arc<Mutex<DocumentStore<E>>>,
    env: E,
}

impl<E> DocumentService<E>
where
    E: Environment,
{
    /// Create a service over an empty store.
    pub fn new(env: E, config: StoreConfig) -> Self {
        Self::from_store(DocumentStore::with_config(env, config))
    }

    /// Wrap an existing store.
    pub fn from_store(store: DocumentStore<E>) -> Self {
        let env = store.env().clone();
        Self { store: Arc::new(Mutex::new(store)), env }
    }

    /// Environment shared with the store.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Metadata for every registered document, newest first.
    pub async fn list_documents(&self) -> Vec<DocumentMetadata> {
        self.store.lock().await.list_documents()
    }

    /// Acquire the exclusive lock on a document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockUnavailable` if the key is unknown or held.
    pub async fn lock_document(&self, key: &str) -> Result<LockedDocument, StoreError> {
        self.store.lock().await.lock_document(key)
    }

    /// Read the last saved version of an unlocked document.
    pub async fn get_document(&self, key: &str) -> Option<UnlockedDocument> {
        self.store.lock().await.get_document(key)
    }

    /// Commit edits under a lock and unlock the document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockExpired` if the lock is no longer valid.
    pub async fn save_document(&self, doc: LockedDocument) -> Result<UnlockedDocument, StoreError> {
        self.store.lock().await.save_document(doc)
    }

    /// Abandon a lock, restoring the pre-edit document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockExpired` if the lock is no longer valid.
    pub async fn release_lock(&self, doc: &LockedDocument) -> Result<(), StoreError> {
        self.store.lock().await.release_lock(doc)
    }

    /// Register a new unlocked document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DocumentExists` if the key is already registered.
    pub async fn insert_document(&self, doc: UnlockedDocument) -> Result<(), StoreError> {
        self.store.lock().await.insert_document(doc)
    }

    /// Evict every lock whose expiry has passed.
    pub async fn evict_expired(&self) -> Vec<String> {
        self.store.lock().await.evict_expired()
    }

    /// Copy of the full store state.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.store.lock().await.snapshot()
    }

    /// Number of registered and locked documents.
    pub async fn counts(&self) -> (usize, usize) {
        let store = self.store.lock().await;
        (store.document_count(), store.locked_count())
    }
}

impl<E> Clone for DocumentService<E>
where
    E: Environment,
{
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), env: self.env.clone() }
    }
}

impl<E> std::fmt::Debug for DocumentService<E>
where
    E: Environment,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService").finish_non_exhaustive()
    }
}
