//! Document Service tests
//!
//! Exercise the shared service the way a transport would: many independent
//! callers against one store.

use std::{sync::Arc, time::Duration};

use penlock_core::{
    DocumentMetadata, ExpiredReason, LockToken, LockedDocument, StoreConfig, StoreError,
    UnavailableReason, UnlockedDocument,
};
use penlock_server::{
    DocumentService, ExpiryPolicy, Server, ServerConfig, ServerError, SystemEnv,
};

async fn service_with_doc_a() -> DocumentService<SystemEnv> {
    let service = DocumentService::new(SystemEnv::new(), StoreConfig::default());
    service.insert_document(UnlockedDocument::new("A", "Doc A", "v1")).await.unwrap();
    service
}

#[tokio::test]
async fn lock_save_scenario() {
    let service = service_with_doc_a().await;

    let locked = service.lock_document("A").await.unwrap();
    assert_eq!(service.get_document("A").await, None);

    let saved = service.save_document(locked.edited("Doc A", "v2")).await.unwrap();
    assert_eq!(saved, UnlockedDocument::new("A", "Doc A", "v2"));
    assert_eq!(service.get_document("A").await, Some(UnlockedDocument::new("A", "Doc A", "v2")));
}

#[tokio::test]
async fn double_lock_scenario() {
    let service = service_with_doc_a().await;

    service.lock_document("A").await.unwrap();
    let second = service.lock_document("A").await;

    assert!(matches!(
        second,
        Err(StoreError::LockUnavailable { reason: UnavailableReason::AlreadyLocked, .. })
    ));
}

#[tokio::test]
async fn brand_new_key_scenario() {
    let service = service_with_doc_a().await;
    let doc = LockedDocument {
        lock_token: LockToken::from("anything"),
        expiry: std::time::SystemTime::now(),
        key: "Z".to_string(),
        title: "New".to_string(),
        contents: "hi".to_string(),
    };

    service.save_document(doc).await.unwrap();

    assert_eq!(service.get_document("Z").await, Some(UnlockedDocument::new("Z", "New", "hi")));
    assert_eq!(
        service.list_documents().await.first(),
        Some(&DocumentMetadata { key: "Z".to_string(), title: "New".to_string() })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_locks_admit_exactly_one() {
    const CALLERS: usize = 64;

    let service = service_with_doc_a().await;
    let barrier = Arc::new(tokio::sync::Barrier::new(CALLERS));

    let tasks: Vec<_> = (0..CALLERS)
        .map(|_| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                service.lock_document("A").await
            })
        })
        .collect();

    let mut successes = 0;
    let mut unavailable = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(StoreError::LockUnavailable { .. }) => unavailable += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(unavailable, CALLERS - 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_save_and_release_race_has_one_winner() {
    let service = service_with_doc_a().await;
    let locked = service.lock_document("A").await.unwrap();

    let saver = {
        let service = service.clone();
        let doc = locked.clone().edited("Doc A", "saved");
        tokio::spawn(async move { service.save_document(doc).await.map(|_| ()) })
    };
    let releaser = {
        let service = service.clone();
        let doc = locked.clone();
        tokio::spawn(async move { service.release_lock(&doc).await })
    };

    let results = [saver.await.unwrap(), releaser.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();

    assert_eq!(winners, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StoreError::LockExpired { .. }))
    );

    let snapshot = service.snapshot().await;
    assert!(snapshot.locked.is_empty());
    assert_eq!(snapshot.unlocked.len(), 1);
}

#[tokio::test]
async fn advisory_server_has_no_sweeper() {
    let server = Server::start(SystemEnv::new(), ServerConfig::default()).unwrap();

    assert!(!server.enforces_expiry());
    server.shutdown();
}

#[tokio::test]
async fn enforced_server_evicts_stale_locks() {
    let config = ServerConfig {
        store: StoreConfig { lock_duration: Duration::from_millis(50) },
        expiry: ExpiryPolicy::Enforced { sweep_interval: Duration::from_millis(10) },
    };
    let server = Server::start(SystemEnv::new(), config).unwrap();
    assert!(server.enforces_expiry());

    let service = server.service().clone();
    service.insert_document(UnlockedDocument::new("A", "Doc A", "v1")).await.unwrap();
    let locked = service.lock_document("A").await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(service.get_document("A").await, Some(UnlockedDocument::new("A", "Doc A", "v1")));
    assert_eq!(
        service.release_lock(&locked).await,
        Err(StoreError::LockExpired { key: "A".to_string(), reason: ExpiredReason::NotLocked })
    );

    server.shutdown();
}

#[test]
fn invalid_config_is_rejected() {
    let config = ServerConfig {
        store: StoreConfig { lock_duration: Duration::ZERO },
        expiry: ExpiryPolicy::Advisory,
    };

    assert!(Server::start(SystemEnv::new(), config).is_err());
}

#[test]
fn enforced_expiry_outside_runtime_is_rejected() {
    let config = ServerConfig {
        expiry: ExpiryPolicy::Enforced { sweep_interval: Duration::from_secs(1) },
        ..ServerConfig::default()
    };

    let result = Server::start(SystemEnv::new(), config);

    assert!(matches!(result, Err(ServerError::Config(_))));
}

#[test]
fn advisory_server_starts_without_runtime() {
    let server = Server::start(SystemEnv::new(), ServerConfig::default()).unwrap();

    assert!(!server.enforces_expiry());
    assert_eq!(server.config().expiry, ExpiryPolicy::Advisory);
}
