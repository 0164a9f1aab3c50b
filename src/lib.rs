//! dsquery - query construction and join resolution for a schemaless document store
//!
//! Structured clauses become query text, fetched rows are joined through
//! key-typed properties with one batched lookup, and results can be reduced
//! to a single aggregate. Execution and lookup are injected collaborators.

pub mod aggregate;
pub mod cli;
pub mod join;
pub mod observability;
pub mod query;
pub mod session;
pub mod value;
