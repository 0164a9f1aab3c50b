//! Query construction
//!
//! Turns structured filter clauses into query text.
//!
//! # Pipeline
//!
//! 1. Validate every clause against its declared type (errors are collected)
//! 2. Expand `IN` clauses into at most 50 variants
//! 3. Render one query string per variant
//!
//! Nothing is emitted unless every clause is valid.

mod builder;
mod clause;
mod errors;
mod expand;
mod literal;

pub use builder::{build_clause, build_queries, build_query, validate_clauses, QuerySpec};
pub use clause::{split_list, ClauseList, Operator, SortDirection, WhereClause, KEY_FIELD};
pub use errors::{ClauseError, QueryError, QueryResult};
pub use expand::{expand_in_clauses, MAX_COMBINATIONS};
pub use literal::{build_list_literals, build_literal, literal_for};
