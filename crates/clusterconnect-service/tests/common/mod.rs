//! Instrumented project stores shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use clusterconnect_db_memory::InMemoryProjectStorage;
use clusterconnect_service::{CacheBackend, ProjectCache};
use clusterconnect_storage::{Project, ProjectFilter, ProjectInput, ProjectStorage, StorageError};
use tokio::sync::{Mutex, Notify, oneshot};

/// Counts store calls and can be switched into an unavailable state.
#[derive(Default)]
pub struct CountingStorage {
    pub inner: InMemoryProjectStorage,
    pub reads_by_id: AtomicUsize,
    pub reads_all: AtomicUsize,
    pub reads_filtered: AtomicUsize,
    pub writes: AtomicUsize,
    pub down: AtomicBool,
}

impl CountingStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reads_by_id(&self) -> usize {
        self.reads_by_id.load(Ordering::SeqCst)
    }

    pub fn reads_all(&self) -> usize {
        self.reads_all.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectStorage for CountingStorage {
    async fn get_by_id(&self, id: i32) -> Result<Option<Project>, StorageError> {
        self.reads_by_id.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_by_id(id).await
    }

    async fn get_all(&self) -> Result<Vec<Project>, StorageError> {
        self.reads_all.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_all().await
    }

    async fn get_by_filter(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StorageError> {
        self.reads_filtered.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_by_filter(filter).await
    }

    async fn insert(&self, input: &ProjectInput) -> Result<Project, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.insert(input).await
    }

    async fn overwrite(&self, id: i32, input: &ProjectInput) -> Result<Project, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.overwrite(id, input).await
    }

    async fn remove(&self, id: i32) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.remove(id).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// Holds the next `get_by_id` after it has read the store, until released.
///
/// Lets a test interleave a write between a reader's store fetch and its
/// cache population.
pub struct GatedStorage {
    pub inner: InMemoryProjectStorage,
    pub read_done: Notify,
    release: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedStorage {
    pub fn new() -> (Arc<Self>, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let storage = Arc::new(Self {
            inner: InMemoryProjectStorage::new(),
            read_done: Notify::new(),
            release: Mutex::new(Some(rx)),
        });
        (storage, tx)
    }
}

#[async_trait]
impl ProjectStorage for GatedStorage {
    async fn get_by_id(&self, id: i32) -> Result<Option<Project>, StorageError> {
        let result = self.inner.get_by_id(id).await;
        let gate = self.release.lock().await.take();
        if let Some(release) = gate {
            self.read_done.notify_one();
            let _ = release.await;
        }
        result
    }

    async fn get_all(&self) -> Result<Vec<Project>, StorageError> {
        self.inner.get_all().await
    }

    async fn get_by_filter(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StorageError> {
        self.inner.get_by_filter(filter).await
    }

    async fn insert(&self, input: &ProjectInput) -> Result<Project, StorageError> {
        self.inner.insert(input).await
    }

    async fn overwrite(&self, id: i32, input: &ProjectInput) -> Result<Project, StorageError> {
        self.inner.overwrite(id, input).await
    }

    async fn remove(&self, id: i32) -> Result<(), StorageError> {
        self.inner.remove(id).await
    }

    fn backend_name(&self) -> &'static str {
        "gated"
    }
}

/// Local cache with the default TTLs.
pub fn local_cache() -> ProjectCache {
    local_cache_with_ttl(Duration::from_secs(600), Duration::from_secs(300))
}

pub fn local_cache_with_ttl(project_ttl: Duration, list_ttl: Duration) -> ProjectCache {
    ProjectCache::new(CacheBackend::new_local(), project_ttl, list_ttl)
}

/// Redis cache pointing at a closed port: every cache operation fails.
pub fn unreachable_redis_cache() -> ProjectCache {
    let pool = deadpool_redis::Config::from_url("redis://127.0.0.1:1")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("create pool");
    ProjectCache::new(
        CacheBackend::new_redis(pool, Duration::from_millis(200)),
        Duration::from_secs(600),
        Duration::from_secs(300),
    )
}
