//! Value model
//!
//! Typed property values of a schemaless document store and their three
//! textual projections:
//!
//! - the tagged wire form (`wire`), as returned by the store
//! - the editable string (`edit`), which round-trips every variant but `entity`
//! - the query literal, built from clauses in `query::literal`
//!
//! # Invariants
//!
//! - A value has exactly one variant (closed enum)
//! - `from_edit_string(to_edit_string(v)) == v` for every non-entity `v`
//! - Equal keys have equal canonical strings; different keys never collide

mod edit;
mod errors;
mod key;
mod property;
mod scan;
pub mod wire;

pub use edit::{element_literal, format_double, from_edit_string, to_edit_string};
pub use errors::{ValueError, ValueResult};
pub use key::{Key, KeyId, PathElement};
pub use property::{Entity, GeoPoint, Properties, PropertyValue, ValueType};

pub(crate) use scan::{double_quote, is_plain_identifier, single_quote};
