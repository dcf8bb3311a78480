use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use clusterconnect_storage::{
    Project, ProjectFilter, ProjectInput, ProjectStorage, StorageError, sort_newest_first,
};
use papaya::HashMap as PapayaHashMap;
use time::OffsetDateTime;

/// In-memory project storage backend using papaya lock-free HashMap.
///
/// Identities are assigned from a monotonically increasing counter starting
/// at 1 and are never reused, matching a database identity column.
#[derive(Debug)]
pub struct InMemoryProjectStorage {
    data: PapayaHashMap<i32, Project>,
    next_id: AtomicI32,
}

impl Default for InMemoryProjectStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProjectStorage {
    /// Creates a new, empty in-memory storage.
    pub fn new() -> Self {
        Self {
            data: PapayaHashMap::new(),
            next_id: AtomicI32::new(1),
        }
    }

    /// Number of stored projects.
    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect(&self, filter: Option<&ProjectFilter>) -> Vec<Project> {
        let guard = self.data.pin();
        let mut projects: Vec<Project> = guard
            .iter()
            .filter(|(_, project)| filter.is_none_or(|f| f.matches(project)))
            .map(|(_, project)| project.clone())
            .collect();
        sort_newest_first(&mut projects);
        projects
    }
}

#[async_trait]
impl ProjectStorage for InMemoryProjectStorage {
    async fn get_by_id(&self, id: i32) -> Result<Option<Project>, StorageError> {
        Ok(self.data.pin().get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Project>, StorageError> {
        Ok(self.collect(None))
    }

    async fn get_by_filter(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StorageError> {
        Ok(self.collect(Some(filter)))
    }

    async fn insert(&self, input: &ProjectInput) -> Result<Project, StorageError> {
        input.validate()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let project = Project::from_input(id, input, OffsetDateTime::now_utc());
        self.data.pin().insert(id, project.clone());
        Ok(project)
    }

    async fn overwrite(&self, id: i32, input: &ProjectInput) -> Result<Project, StorageError> {
        input.validate()?;
        let now = OffsetDateTime::now_utc();
        self.data
            .pin()
            .update(id, |existing| existing.overwritten(input, now))
            .cloned()
            .ok_or_else(|| StorageError::not_found(id))
    }

    async fn remove(&self, id: i32) -> Result<(), StorageError> {
        self.data
            .pin()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(id))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
