//! Draft and history persistence
//!
//! The store is a plain name/value collaborator. Clause drafts live under
//! `draft:<kind>` and the query history under `query_history`, both as JSON.
//! `MemoryDraftStore` serves tests and embedding; `FileDraftStore` keeps
//! state across CLI invocations.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::query::ClauseList;

use super::errors::{CollaboratorError, SessionError, SessionResult};

/// Entry holding the query history
pub const HISTORY_ENTRY: &str = "query_history";

/// Default number of remembered queries
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Name/value persistence for session state
pub trait DraftStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, CollaboratorError>;
    fn set(&self, name: &str, value: &str) -> Result<(), CollaboratorError>;
    fn remove(&self, name: &str) -> Result<(), CollaboratorError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CollaboratorError {
    CollaboratorError::new("draft store lock poisoned")
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, name: &str) -> Result<Option<String>, CollaboratorError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), CollaboratorError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), CollaboratorError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(name);
        Ok(())
    }
}

/// Store backed by one JSON object file
///
/// A missing file reads as empty. Writes replace the whole file through a
/// temporary sibling and a rename.
#[derive(Debug)]
pub struct FileDraftStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileDraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, CollaboratorError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CollaboratorError::new(format!("{}: invalid store file: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(CollaboratorError::new(format!("{}: {}", self.path.display(), e))),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), CollaboratorError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| CollaboratorError::new(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| CollaboratorError::new(format!("{}: {}", self.path.display(), e)))
    }

    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), CollaboratorError> {
        let _guard = self.guard.lock().map_err(|_| poisoned())?;
        let mut entries = self.read_entries()?;
        change(&mut entries);
        self.write_entries(&entries)
    }
}

impl DraftStore for FileDraftStore {
    fn get(&self, name: &str) -> Result<Option<String>, CollaboratorError> {
        let _guard = self.guard.lock().map_err(|_| poisoned())?;
        Ok(self.read_entries()?.remove(name))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), CollaboratorError> {
        self.update(|entries| {
            entries.insert(name.to_string(), value.to_string());
        })
    }

    fn remove(&self, name: &str) -> Result<(), CollaboratorError> {
        self.update(|entries| {
            entries.remove(name);
        })
    }
}

fn store_error(err: impl std::fmt::Display) -> SessionError {
    SessionError::Store(err.to_string())
}

/// Entry name of the clause draft for `kind`
pub fn draft_entry(kind: &str) -> String {
    format!("draft:{}", kind)
}

/// Saves the clause draft of `kind`
pub fn save_draft(store: &dyn DraftStore, kind: &str, clauses: &ClauseList) -> SessionResult<()> {
    let json = serde_json::to_string(clauses).map_err(store_error)?;
    store.set(&draft_entry(kind), &json).map_err(store_error)
}

/// Loads the clause draft of `kind`, if one was saved
pub fn load_draft(store: &dyn DraftStore, kind: &str) -> SessionResult<Option<ClauseList>> {
    match store.get(&draft_entry(kind)).map_err(store_error)? {
        Some(json) => {
            let clauses: ClauseList = serde_json::from_str(&json).map_err(store_error)?;
            Ok(Some(clauses))
        }
        None => Ok(None),
    }
}

pub fn discard_draft(store: &dyn DraftStore, kind: &str) -> SessionResult<()> {
    store.remove(&draft_entry(kind)).map_err(store_error)
}

/// Most recent distinct query texts, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryHistory {
    limit: usize,
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl QueryHistory {
    /// A limit of zero is raised to one
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn load(&self, store: &dyn DraftStore) -> SessionResult<Vec<String>> {
        match store.get(HISTORY_ENTRY).map_err(store_error)? {
            Some(json) => serde_json::from_str(&json).map_err(store_error),
            None => Ok(Vec::new()),
        }
    }

    /// Moves `query` to the front, dropping its older copy and anything past the limit
    pub fn record(&self, store: &dyn DraftStore, query: &str) -> SessionResult<Vec<String>> {
        let mut entries = self.load(store)?;
        entries.retain(|q| q != query);
        entries.insert(0, query.to_string());
        entries.truncate(self.limit);

        let json = serde_json::to_string(&entries).map_err(store_error)?;
        store.set(HISTORY_ENTRY, &json).map_err(store_error)?;
        Ok(entries)
    }

    pub fn clear(&self, store: &dyn DraftStore) -> SessionResult<()> {
        store.remove(HISTORY_ENTRY).map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Operator;
    use crate::value::ValueType;

    #[test]
    fn test_history_dedup_and_order() {
        let store = MemoryDraftStore::new();
        let history = QueryHistory::new(3);

        history.record(&store, "A").unwrap();
        history.record(&store, "B").unwrap();
        let entries = history.record(&store, "A").unwrap();

        assert_eq!(entries, vec!["A", "B"]);
        assert_eq!(history.load(&store).unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_history_limit() {
        let store = MemoryDraftStore::new();
        let history = QueryHistory::new(2);
        for q in ["A", "B", "C"] {
            history.record(&store, q).unwrap();
        }
        assert_eq!(history.load(&store).unwrap(), vec!["C", "B"]);

        history.clear(&store).unwrap();
        assert!(history.load(&store).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_history_is_store_error() {
        let store = MemoryDraftStore::new();
        store.set(HISTORY_ENTRY, "not json").unwrap();
        let err = QueryHistory::default().load(&store).unwrap_err();
        assert_eq!(err.code(), "DSQ_STORE_FAILED");
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = FileDraftStore::new(&path);
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("b").unwrap();

        let reopened = FileDraftStore::new(&path);
        assert_eq!(reopened.get("a").unwrap(), Some("1".to_string()));
        assert_eq!(reopened.get("b").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(FileDraftStore::new(&path).get("a").is_err());
    }

    #[test]
    fn test_draft_round_trip() {
        let store = MemoryDraftStore::new();
        let clauses = ClauseList::new()
            .with_clause("age", Operator::Gt, ValueType::Integer, "30")
            .with_clause("name", Operator::Eq, ValueType::String, "Ada");

        save_draft(&store, "Person", &clauses).unwrap();
        assert!(store.get("draft:Person").unwrap().is_some());
        assert_eq!(load_draft(&store, "Person").unwrap(), Some(clauses));

        discard_draft(&store, "Person").unwrap();
        assert_eq!(load_draft(&store, "Person").unwrap(), None);
    }
}
