//! External collaborators
//!
//! The engine never talks to the store itself. Query execution, batched key
//! lookup and the current project are injected through these traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::value::{Entity, Key};

use super::errors::CollaboratorError;

/// Runs one query string against the store
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run_query(
        &self,
        query: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<Entity>, CollaboratorError>;
}

/// Fetches rows by key in one batch
///
/// Keys with no stored row are absent from the result.
#[async_trait]
pub trait KeyLookup: Send + Sync {
    async fn lookup_by_keys(&self, keys: &[Key]) -> Result<Vec<Entity>, CollaboratorError>;
}

/// Supplies the project keys are resolved against
pub trait ProjectContext: Send + Sync {
    fn current_project(&self) -> String;
}

/// Fixed project id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticProject(pub String);

impl StaticProject {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self(project_id.into())
    }
}

impl ProjectContext for StaticProject {
    fn current_project(&self) -> String {
        self.0.clone()
    }
}

/// Key lookup over rows held in memory
///
/// Rows are indexed by canonical key string, so a key with an empty project
/// matches a row stored under the current project.
#[derive(Debug)]
pub struct MemoryLookup {
    project_id: String,
    rows: HashMap<String, Entity>,
    calls: AtomicUsize,
}

impl MemoryLookup {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            rows: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Builds a lookup over `rows`; a later row replaces an earlier one with the same key
    pub fn with_rows(project_id: impl Into<String>, rows: impl IntoIterator<Item = Entity>) -> Self {
        let mut lookup = Self::new(project_id);
        for row in rows {
            lookup.insert(row);
        }
        lookup
    }

    pub fn insert(&mut self, row: Entity) {
        let canonical = row.key.canonical_string(&self.project_id);
        self.rows.insert(canonical, row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of `lookup_by_keys` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyLookup for MemoryLookup {
    async fn lookup_by_keys(&self, keys: &[Key]) -> Result<Vec<Entity>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(keys
            .iter()
            .filter_map(|key| self.rows.get(&key.canonical_string(&self.project_id)))
            .cloned()
            .collect())
    }
}
