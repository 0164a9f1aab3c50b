//! Join resolution
//!
//! Follows key-typed properties of a result set to the rows they reference,
//! with at most one batched lookup per run.

mod resolver;

pub use resolver::{
    collect_join_keys, joined_property_name, merge_joined, parse_join_properties, resolve_joins,
    JoinReport, JOINED_SUFFIX,
};
