//! Browse sessions
//!
//! Wires the pure query, join and aggregate stages to injected collaborators:
//! - `QueryRunner` executes query text
//! - `KeyLookup` fetches rows by key in one batch
//! - `ProjectContext` names the current project
//! - `DraftStore` persists clause drafts and query history

mod browse;
mod collaborators;
mod errors;
mod store;

pub use browse::{AggregateRequest, BrowseOutcome, BrowseRequest, QuerySession};
pub use collaborators::{KeyLookup, MemoryLookup, ProjectContext, QueryRunner, StaticProject};
pub use errors::{CollaboratorError, SessionError, SessionResult};
pub use store::{
    discard_draft, draft_entry, load_draft, save_draft, DraftStore, FileDraftStore,
    MemoryDraftStore, QueryHistory, DEFAULT_HISTORY_LIMIT, HISTORY_ENTRY,
};
