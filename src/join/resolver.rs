//! Join resolution
//!
//! 1. Parse the join property list
//! 2. Collect key-typed values of those properties, deduplicated
//! 3. One batched lookup for the whole set
//! 4. Merge fetched rows back as `<property>_joined` entity values
//!
//! Absent properties and non-key values are skipped silently. A key with no
//! fetched row leaves its row untouched for that property.

use std::collections::{HashMap, HashSet};

use crate::observability::{log_event_with_fields, Event, Logger};
use crate::session::{CollaboratorError, KeyLookup};
use crate::value::{Entity, Key, PropertyValue};

/// Suffix of synthesized join properties
pub const JOINED_SUFFIX: &str = "_joined";

/// Outcome of one join pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinReport {
    /// Input rows with joined properties merged in
    pub rows: Vec<Entity>,
    /// Distinct keys sent to the lookup
    pub requested: usize,
    /// Distinct keys that matched a fetched row
    pub resolved: usize,
    /// Distinct keys that matched nothing
    pub unresolved: usize,
}

impl JoinReport {
    fn unjoined(rows: Vec<Entity>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

/// Name of the property a join of `property` is stored under
pub fn joined_property_name(property: &str) -> String {
    format!("{}{}", property, JOINED_SUFFIX)
}

/// Splits a comma-separated property list; empties and repeats are dropped
pub fn parse_join_properties(spec: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    spec.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Keys held by the named properties, first-seen order, one per canonical string
pub fn collect_join_keys(rows: &[Entity], properties: &[String], current_project: &str) -> Vec<Key> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();

    for row in rows {
        for property in properties {
            if let Some(key) = row.get(property).and_then(PropertyValue::as_key) {
                if seen.insert(key.canonical_string(current_project)) {
                    keys.push(key.clone());
                }
            }
        }
    }

    keys
}

/// Merges fetched rows into `rows`
///
/// Rows without any resolved reference come back equal to their input.
pub fn merge_joined(
    rows: &[Entity],
    properties: &[String],
    fetched: &[Entity],
    current_project: &str,
) -> Vec<Entity> {
    let index = index_by_key(fetched, current_project);

    rows.iter()
        .map(|row| {
            let mut merged = row.clone();
            for property in properties {
                let target = row
                    .get(property)
                    .and_then(PropertyValue::as_key)
                    .and_then(|key| index.get(&key.canonical_string(current_project)));
                if let Some(target) = target {
                    merged.properties.insert(
                        joined_property_name(property),
                        PropertyValue::Entity(target.properties.clone()),
                    );
                }
            }
            merged
        })
        .collect()
}

fn index_by_key<'a>(fetched: &'a [Entity], current_project: &str) -> HashMap<String, &'a Entity> {
    fetched
        .iter()
        .map(|row| (row.key.canonical_string(current_project), row))
        .collect()
}

/// Resolves the joins named by `spec` with a single batched lookup
///
/// No lookup is issued when `spec` names no property or no row holds a key.
pub async fn resolve_joins<L>(
    lookup: &L,
    rows: Vec<Entity>,
    spec: &str,
    current_project: &str,
) -> Result<JoinReport, CollaboratorError>
where
    L: KeyLookup + ?Sized,
{
    let properties = parse_join_properties(spec);
    if properties.is_empty() {
        return Ok(JoinReport::unjoined(rows));
    }

    let keys = collect_join_keys(&rows, &properties, current_project);
    if keys.is_empty() {
        return Ok(JoinReport::unjoined(rows));
    }

    let requested = keys.len().to_string();
    log_event_with_fields(
        Event::JoinLookup,
        &[("keys", requested.as_str()), ("properties", spec.trim())],
    );

    let fetched = lookup.lookup_by_keys(&keys).await?;

    let index = index_by_key(&fetched, current_project);
    let resolved = keys
        .iter()
        .filter(|key| index.contains_key(&key.canonical_string(current_project)))
        .count();
    let unresolved = keys.len() - resolved;

    let resolved_count = resolved.to_string();
    log_event_with_fields(
        Event::JoinResolved,
        &[("keys", requested.as_str()), ("resolved", resolved_count.as_str())],
    );
    if unresolved > 0 {
        let unresolved_count = unresolved.to_string();
        Logger::warn(
            Event::JoinUnresolved.as_str(),
            &[("properties", spec.trim()), ("unresolved", unresolved_count.as_str())],
        );
    }

    Ok(JoinReport {
        rows: merge_joined(&rows, &properties, &fetched, current_project),
        requested: keys.len(),
        resolved,
        unresolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryLookup;

    fn order(id: i64, customer: Option<Key>) -> Entity {
        let row = Entity::new(Key::root("p", "Order", id));
        match customer {
            Some(key) => row.with_property("customer", key),
            None => row,
        }
    }

    #[test]
    fn test_parse_join_properties() {
        assert_eq!(
            parse_join_properties(" customer, ,owner ,customer"),
            vec!["customer".to_string(), "owner".to_string()]
        );
        assert!(parse_join_properties(" , ").is_empty());
    }

    #[test]
    fn test_collect_dedups_by_canonical_string() {
        let ada = Key::root("p", "Customer", 1);
        let rows = vec![
            order(1, Some(ada.clone())),
            order(2, Some(Key::root("", "Customer", 1))),
            order(3, Some(Key::root("p", "Customer", "1"))),
            order(4, None),
        ];
        let keys = collect_join_keys(&rows, &["customer".to_string()], "p");
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], ada);
    }

    #[test]
    fn test_non_key_values_skipped() {
        let rows = vec![Entity::new(Key::root("p", "Order", 1)).with_property("customer", "Ada")];
        assert!(collect_join_keys(&rows, &["customer".to_string()], "p").is_empty());
    }

    #[test]
    fn test_merge_adds_joined_entity() {
        let customer = Key::root("p", "Customer", 1);
        let rows = vec![order(1, Some(customer.clone())), order(2, None)];
        let fetched = vec![Entity::new(customer).with_property("name", "Ada")];

        let merged = merge_joined(&rows, &["customer".to_string()], &fetched, "p");

        match merged[0].get("customer_joined") {
            Some(PropertyValue::Entity(props)) => {
                assert_eq!(props.get("name"), Some(&PropertyValue::from("Ada")));
            }
            other => panic!("expected joined entity, got {:?}", other),
        }
        assert_eq!(merged[1], rows[1]);
    }

    #[test]
    fn test_fetched_row_without_properties_joins_empty_entity() {
        let customer = Key::root("p", "Customer", 1);
        let rows = vec![order(1, Some(customer.clone()))];
        let merged = merge_joined(&rows, &["customer".to_string()], &[Entity::new(customer)], "p");
        assert_eq!(
            merged[0].get("customer_joined"),
            Some(&PropertyValue::Entity(Default::default()))
        );
    }

    #[tokio::test]
    async fn test_resolve_issues_one_lookup() {
        let ada = Key::root("p", "Customer", 1);
        let lookup = MemoryLookup::with_rows("p", vec![Entity::new(ada.clone()).with_property("name", "Ada")]);
        let rows = vec![
            order(1, Some(ada.clone())),
            order(2, Some(ada)),
            order(3, Some(Key::root("p", "Customer", 99))),
        ];

        let report = resolve_joins(&lookup, rows.clone(), "customer", "p").await.unwrap();

        assert_eq!(lookup.calls(), 1);
        assert_eq!(report.requested, 2);
        assert_eq!(report.resolved, 1);
        assert_eq!(report.unresolved, 1);
        assert!(report.rows[0].get("customer_joined").is_some());
        assert!(report.rows[1].get("customer_joined").is_some());
        assert_eq!(report.rows[2], rows[2]);
    }

    #[tokio::test]
    async fn test_resolve_without_keys_skips_lookup() {
        let lookup = MemoryLookup::new("p");
        let rows = vec![order(1, None)];

        let report = resolve_joins(&lookup, rows.clone(), "customer", "p").await.unwrap();
        assert_eq!(report.rows, rows);

        let report = resolve_joins(&lookup, rows.clone(), "", "p").await.unwrap();
        assert_eq!(report.requested, 0);
        assert_eq!(lookup.calls(), 0);
    }
}
