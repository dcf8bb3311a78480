//! Integration tests for the cache-aside project service.
//!
//! All tests run against the in-memory store and the local or an unreachable
//! cache backend; no external services are needed.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use clusterconnect_db_memory::InMemoryProjectStorage;
use clusterconnect_service::{CacheBackend, LIST_KEY, ProjectCache, ProjectService};
use clusterconnect_storage::{
    Project, ProjectFilter, ProjectInput, ProjectStorage, StorageError, status,
};
use common::{
    CountingStorage, GatedStorage, local_cache, local_cache_with_ttl, unreachable_redis_cache,
};

async fn run_scenario(service: &ProjectService) {
    let created = service.create(&ProjectInput::new("X")).await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.title, "X");

    let all = service.get_all().await.unwrap();
    assert_eq!(all[0].id, 1);

    let updated = service.update(1, &ProjectInput::new("Y")).await.unwrap();
    assert_eq!(updated.title, "Y");
    assert_eq!(service.get_by_id(1).await.unwrap().title, "Y");
    assert_eq!(service.get_all().await.unwrap()[0].title, "Y");

    service.delete(1).await.unwrap();
    assert_eq!(
        service.get_by_id(1).await.unwrap_err(),
        StorageError::not_found(1)
    );
    assert!(service.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scenario_with_local_cache() {
    let service = ProjectService::new(Arc::new(InMemoryProjectStorage::new()), local_cache());
    run_scenario(&service).await;
}

#[tokio::test]
async fn test_scenario_without_cache() {
    let service = ProjectService::without_cache(Arc::new(InMemoryProjectStorage::new()));
    run_scenario(&service).await;
}

#[tokio::test]
async fn test_scenario_with_unreachable_cache() {
    let service = ProjectService::new(
        Arc::new(InMemoryProjectStorage::new()),
        unreachable_redis_cache(),
    );
    run_scenario(&service).await;
}

#[tokio::test]
async fn test_cache_transparency() {
    let storage = Arc::new(InMemoryProjectStorage::new());
    let cached = ProjectService::new(storage.clone(), local_cache());
    let direct = ProjectService::without_cache(storage);

    let a = cached
        .create(&ProjectInput::new("A").with_status(status::ACTIVE))
        .await
        .unwrap();
    let b = cached.create(&ProjectInput::new("B")).await.unwrap();

    // Read twice through the cached service so the second read is a hit.
    for _ in 0..2 {
        assert_eq!(cached.get_by_id(a.id).await, direct.get_by_id(a.id).await);
        assert_eq!(cached.get_all().await, direct.get_all().await);
    }

    cached
        .update(b.id, &ProjectInput::new("B2").with_team_size(4))
        .await
        .unwrap();
    assert_eq!(cached.get_by_id(b.id).await, direct.get_by_id(b.id).await);
    assert_eq!(cached.get_all().await, direct.get_all().await);

    cached.delete(a.id).await.unwrap();
    assert_eq!(cached.get_by_id(a.id).await, direct.get_by_id(a.id).await);
    assert_eq!(cached.delete(a.id).await, direct.delete(a.id).await);
    assert_eq!(cached.get_all().await, direct.get_all().await);

    let filter = ProjectFilter::by_status("planning");
    assert_eq!(
        cached.get_by_filter(&filter).await,
        direct.get_by_filter(&filter).await
    );
}

#[tokio::test]
async fn test_update_replaces_stale_entries() {
    let storage = Arc::new(InMemoryProjectStorage::new());
    let service = ProjectService::new(storage.clone(), local_cache());
    let created = service.create(&ProjectInput::new("X")).await.unwrap();

    // Pre-populate both keys with a value the store never held.
    let stale = Project {
        title: "stale".into(),
        ..created.clone()
    };
    service.cache().set_project(&stale).await;
    service.cache().set_list(std::slice::from_ref(&stale)).await;
    assert_eq!(service.get_by_id(created.id).await.unwrap().title, "stale");

    service
        .update(created.id, &ProjectInput::new("Y"))
        .await
        .unwrap();

    assert_eq!(service.get_by_id(created.id).await.unwrap().title, "Y");
    assert_eq!(service.get_all().await.unwrap()[0].title, "Y");
}

#[tokio::test]
async fn test_delete_replaces_stale_entries() {
    let service = ProjectService::new(Arc::new(InMemoryProjectStorage::new()), local_cache());
    let created = service.create(&ProjectInput::new("X")).await.unwrap();

    service.get_by_id(created.id).await.unwrap();
    service.get_all().await.unwrap();

    service.delete(created.id).await.unwrap();

    assert!(service.get_by_id(created.id).await.unwrap_err().is_not_found());
    assert!(service.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_invalidates_listing_only() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), local_cache());
    let first = service.create(&ProjectInput::new("A")).await.unwrap();

    service.get_by_id(first.id).await.unwrap();
    service.get_all().await.unwrap();
    assert_eq!(storage.reads_all(), 1);

    service.create(&ProjectInput::new("B")).await.unwrap();

    assert_eq!(service.get_all().await.unwrap().len(), 2);
    assert_eq!(storage.reads_all(), 2);
    service.get_by_id(first.id).await.unwrap();
    assert_eq!(storage.reads_by_id(), 1);
}

#[tokio::test]
async fn test_negative_results_are_not_cached() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), local_cache());

    for _ in 0..2 {
        let err = service.get_by_id(42).await.unwrap_err();
        assert_eq!(err, StorageError::not_found(42));
    }
    assert_eq!(storage.reads_by_id(), 2);

    // A project created after the miss is visible immediately.
    let created = service.create(&ProjectInput::new("late")).await.unwrap();
    assert_eq!(service.get_by_id(created.id).await.unwrap().title, "late");
}

#[tokio::test]
async fn test_hit_skips_store() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), local_cache());
    let created = service.create(&ProjectInput::new("X")).await.unwrap();

    for _ in 0..3 {
        service.get_by_id(created.id).await.unwrap();
        service.get_all().await.unwrap();
    }
    assert_eq!(storage.reads_by_id(), 1);
    assert_eq!(storage.reads_all(), 1);
}

#[tokio::test]
async fn test_filtered_reads_always_hit_store() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), local_cache());
    service.create(&ProjectInput::new("X")).await.unwrap();

    let filter = ProjectFilter::by_status(status::PLANNING);
    for _ in 0..3 {
        assert_eq!(service.get_by_filter(&filter).await.unwrap().len(), 1);
    }
    assert_eq!(
        storage
            .reads_filtered
            .load(std::sync::atomic::Ordering::SeqCst),
        3
    );
}

#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(
        storage.clone(),
        local_cache_with_ttl(Duration::from_millis(100), Duration::from_millis(100)),
    );
    let created = service.create(&ProjectInput::new("X")).await.unwrap();

    service.get_by_id(created.id).await.unwrap();
    service.get_by_id(created.id).await.unwrap();
    assert_eq!(storage.reads_by_id(), 1);

    tokio::time::sleep(Duration::from_millis(150)).await;

    service.get_by_id(created.id).await.unwrap();
    assert_eq!(storage.reads_by_id(), 2);
}

#[tokio::test]
async fn test_read_write_race_staleness_is_bounded_by_ttl() {
    let (storage, release) = GatedStorage::new();
    let created = storage.inner.insert(&ProjectInput::new("X")).await.unwrap();
    let service = ProjectService::new(
        storage.clone(),
        local_cache_with_ttl(Duration::from_millis(200), Duration::from_millis(200)),
    );

    // The reader fetches "X" from the store, then stalls before populating.
    let reader = tokio::spawn({
        let service = service.clone();
        async move { service.get_by_id(created.id).await }
    });
    storage.read_done.notified().await;

    // The write lands and invalidates while the reader is stalled.
    service
        .update(created.id, &ProjectInput::new("Y"))
        .await
        .unwrap();
    release.send(()).unwrap();
    assert_eq!(reader.await.unwrap().unwrap().title, "X");

    // The late population left a stale entry behind...
    assert_eq!(service.get_by_id(created.id).await.unwrap().title, "X");

    // ...which lives no longer than its TTL.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(service.get_by_id(created.id).await.unwrap().title, "Y");
}

#[tokio::test]
async fn test_failed_write_does_not_invalidate() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), local_cache());
    let created = service.create(&ProjectInput::new("X")).await.unwrap();
    service.get_by_id(created.id).await.unwrap();
    service.get_all().await.unwrap();

    storage.set_down(true);

    let err = service
        .update(created.id, &ProjectInput::new("Y"))
        .await
        .unwrap_err();
    assert!(err.is_unavailable());
    let err = service.delete(created.id).await.unwrap_err();
    assert!(err.is_unavailable());
    let err = service.create(&ProjectInput::new("Z")).await.unwrap_err();
    assert!(err.is_unavailable());

    let cache = service.cache();
    assert_eq!(cache.get_project(created.id).await.unwrap().title, "X");
    assert!(cache.get_list().await.is_some());
}

#[tokio::test]
async fn test_store_unavailable_on_miss_is_surfaced() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), local_cache());
    storage.set_down(true);

    assert!(service.get_by_id(1).await.unwrap_err().is_unavailable());
    assert!(service.get_all().await.unwrap_err().is_unavailable());
    assert!(service.cache().get_list().await.is_none());
}

#[tokio::test]
async fn test_not_found_writes_are_surfaced() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), local_cache());

    assert_eq!(
        service.update(9, &ProjectInput::new("Y")).await,
        Err(StorageError::not_found(9))
    );
    assert_eq!(service.delete(9).await, Err(StorageError::not_found(9)));
}

#[tokio::test]
async fn test_validation_failure_skips_store() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), local_cache());

    let too_long = ProjectInput::new("t".repeat(201));
    assert!(service.create(&too_long).await.unwrap_err().is_invalid());
    assert!(service.update(1, &too_long).await.unwrap_err().is_invalid());

    let negative = ProjectInput::new("X").with_team_size(-1);
    assert!(service.create(&negative).await.unwrap_err().is_invalid());

    assert_eq!(storage.writes(), 0);
}

#[tokio::test]
async fn test_unreachable_cache_reads_fall_back_to_store() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), unreachable_redis_cache());
    let created = service.create(&ProjectInput::new("X")).await.unwrap();

    for _ in 0..2 {
        assert_eq!(service.get_by_id(created.id).await.unwrap().title, "X");
    }
    assert_eq!(storage.reads_by_id(), 2);
    assert!(!service.cache().backend().is_available().await);
}

#[tokio::test]
async fn test_unresponsive_cache_is_bounded_by_operation_timeout() {
    // Accepts connections and never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let pool = deadpool_redis::Config::from_url(format!("redis://{addr}"))
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let cache = ProjectCache::new(
        CacheBackend::new_redis(pool, Duration::from_millis(100)),
        Duration::from_secs(600),
        Duration::from_secs(300),
    );
    let service = ProjectService::new(Arc::new(InMemoryProjectStorage::new()), cache);
    let created = service.create(&ProjectInput::new("X")).await.unwrap();

    let started = Instant::now();
    assert_eq!(service.get_by_id(created.id).await.unwrap().title, "X");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_corrupt_cached_listing_falls_back_to_store() {
    let storage = CountingStorage::new();
    let service = ProjectService::new(storage.clone(), local_cache());
    service.create(&ProjectInput::new("X")).await.unwrap();

    service
        .cache()
        .backend()
        .set(LIST_KEY, vec![0xc1], Duration::from_secs(60))
        .await;

    assert_eq!(service.get_all().await.unwrap().len(), 1);
    assert_eq!(storage.reads_all(), 1);
    // Repopulated with a decodable value.
    assert_eq!(service.cache().get_list().await.unwrap().len(), 1);
}
