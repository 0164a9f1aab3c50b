//! Query assembly
//!
//! Renders clauses into query text:
//!
//! ```text
//! SELECT * FROM <kind> [WHERE <clause> AND <clause> ...] [ORDER BY <field> <ASC|DESC>] [LIMIT <n>]
//! ```
//!
//! Clause order is preserved exactly; nothing is reordered or optimized.

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event, Logger};
use crate::value::is_plain_identifier;

use super::clause::{Operator, SortDirection, WhereClause, KEY_FIELD};
use super::errors::{ClauseError, QueryError, QueryResult};
use super::expand::expand_in_clauses;
use super::literal::{build_list_literals, build_literal};

/// Renders one clause
pub fn build_clause(clause: &WhereClause) -> Result<String, ClauseError> {
    match clause.operator {
        Operator::HasAncestor => Ok(format!(
            "{} HAS ANCESTOR {}",
            KEY_FIELD,
            build_literal(clause)?
        )),
        Operator::In | Operator::NotIn => Ok(format!(
            "{} {} ARRAY({})",
            clause.field,
            clause.operator,
            build_list_literals(clause)?.join(", ")
        )),
        _ => Ok(format!(
            "{} {} {}",
            clause.field,
            clause.operator,
            build_literal(clause)?
        )),
    }
}

/// Renders one query from a kind, clauses and an optional ordering
///
/// Clauses with an empty field are skipped. The first invalid clause aborts
/// the build; use `validate_clauses` to collect every error.
pub fn build_query(
    kind: &str,
    clauses: &[WhereClause],
    order_field: &str,
    direction: SortDirection,
) -> Result<String, ClauseError> {
    let mut query = select_from(kind);

    let predicates = clauses
        .iter()
        .filter(|c| !c.is_blank())
        .map(build_clause)
        .collect::<Result<Vec<_>, _>>()?;

    if !predicates.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&predicates.join(" AND "));
    }

    let order_field = order_field.trim();
    if !order_field.is_empty() {
        query.push_str(&format!(" ORDER BY {} {}", order_field, direction.as_str()));
    }

    Ok(query)
}

/// Collects the error of every invalid non-blank clause, in source order
pub fn validate_clauses(clauses: &[WhereClause]) -> Vec<ClauseError> {
    clauses
        .iter()
        .filter(|c| !c.is_blank())
        .filter_map(|c| build_clause(c).err())
        .collect()
}

fn select_from(kind: &str) -> String {
    let kind = kind.trim();
    if kind.is_empty() {
        "SELECT *".to_string()
    } else if is_plain_identifier(kind) {
        format!("SELECT * FROM {}", kind)
    } else {
        format!("SELECT * FROM `{}`", kind.replace('`', "``"))
    }
}

/// Everything needed to build the query variants of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub kind: String,
    #[serde(default)]
    pub clauses: Vec<WhereClause>,
    #[serde(default)]
    pub order_field: String,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl QuerySpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_clauses(mut self, clauses: impl Into<Vec<WhereClause>>) -> Self {
        self.clauses = clauses.into();
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_field = field.into();
        self.direction = direction;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Builds the single query for these exact clauses (no IN expansion)
    pub fn build(&self) -> Result<String, ClauseError> {
        self.build_with(&self.clauses)
    }

    fn build_with(&self, clauses: &[WhereClause]) -> Result<String, ClauseError> {
        let mut query = build_query(&self.kind, clauses, &self.order_field, self.direction)?;
        if let Some(limit) = self.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }
        Ok(query)
    }
}

/// Validates every clause, expands `IN` filters and builds one query per variant
///
/// Nothing is returned unless every clause is valid, so no partially built
/// query is ever executed.
pub fn build_queries(spec: &QuerySpec) -> QueryResult<Vec<String>> {
    let errors = validate_clauses(&spec.clauses);
    if !errors.is_empty() {
        let count = errors.len().to_string();
        Logger::warn(
            Event::QueryRejected.as_str(),
            &[("kind", spec.kind.as_str()), ("errors", count.as_str())],
        );
        return Err(QueryError::InvalidClauses(errors));
    }

    let combinations = match expand_in_clauses(&spec.clauses) {
        Ok(combinations) => combinations,
        Err(err) => {
            Logger::warn(
                Event::QueryRejected.as_str(),
                &[("kind", spec.kind.as_str()), ("code", err.code())],
            );
            return Err(err);
        }
    };

    let queries = combinations
        .iter()
        .map(|clauses| spec.build_with(clauses))
        .collect::<Result<Vec<_>, _>>()?;

    if queries.len() > 1 {
        let variants = queries.len().to_string();
        log_event_with_fields(
            Event::QueryVariantsExpanded,
            &[("kind", spec.kind.as_str()), ("variants", variants.as_str())],
        );
    }
    for query in &queries {
        Logger::trace(Event::QueryBuilt.as_str(), &[("query", query.as_str())]);
    }

    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    #[test]
    fn test_single_clause_with_order() {
        let clauses = vec![WhereClause::new(1, "age", Operator::Gt, ValueType::Integer, "30")];
        let query = build_query("Person", &clauses, "age", SortDirection::Desc).unwrap();
        assert_eq!(query, "SELECT * FROM Person WHERE age > 30 ORDER BY age DESC");
    }

    #[test]
    fn test_empty_query() {
        let query = build_query("Person", &[], "", SortDirection::Asc).unwrap();
        assert_eq!(query, "SELECT * FROM Person");
    }

    #[test]
    fn test_blank_fields_skipped() {
        let clauses = vec![
            WhereClause::new(1, "", Operator::Eq, ValueType::Integer, "not a number"),
            WhereClause::new(2, "name", Operator::Eq, ValueType::String, "Ada"),
        ];
        let query = build_query("Person", &clauses, "", SortDirection::Asc).unwrap();
        assert_eq!(query, "SELECT * FROM Person WHERE name = 'Ada'");
        assert!(validate_clauses(&clauses).is_empty());
    }

    #[test]
    fn test_clause_order_preserved() {
        let clauses = vec![
            WhereClause::new(1, "z", Operator::Eq, ValueType::Boolean, "TRUE"),
            WhereClause::new(2, "a", Operator::Le, ValueType::Double, "1.50"),
        ];
        let query = build_query("K", &clauses, "", SortDirection::Asc).unwrap();
        assert_eq!(query, "SELECT * FROM K WHERE z = true AND a <= 1.5");
    }

    #[test]
    fn test_has_ancestor_clause() {
        let clause = WhereClause {
            id: 1,
            field: "owner".to_string(),
            operator: Operator::HasAncestor,
            value_type: ValueType::String,
            value: "KEY(Org, 'acme')".to_string(),
        };
        assert_eq!(
            build_clause(&clause).unwrap(),
            "__key__ HAS ANCESTOR KEY(Org, 'acme')"
        );
    }

    #[test]
    fn test_has_ancestor_with_empty_field_is_kept() {
        let clauses = vec![WhereClause {
            id: 1,
            field: String::new(),
            operator: Operator::HasAncestor,
            value_type: ValueType::String,
            value: "KEY(Org, 'acme')".to_string(),
        }];
        assert_eq!(
            build_query("Person", &clauses, "", SortDirection::Asc).unwrap(),
            "SELECT * FROM Person WHERE __key__ HAS ANCESTOR KEY(Org, 'acme')"
        );

        let mut invalid = clauses;
        invalid[0].value = "Org/acme".to_string();
        assert_eq!(validate_clauses(&invalid).len(), 1);
    }

    #[test]
    fn test_in_and_not_in_clauses() {
        let clause = WhereClause::new(1, "tag", Operator::In, ValueType::String, "a, b");
        assert_eq!(build_clause(&clause).unwrap(), "tag IN ARRAY('a', 'b')");

        let clause = WhereClause::new(1, "n", Operator::NotIn, ValueType::Integer, "1,2");
        assert_eq!(build_clause(&clause).unwrap(), "n NOT IN ARRAY(1, 2)");
    }

    #[test]
    fn test_kind_quoting() {
        assert_eq!(
            build_query("Odd Kind", &[], "", SortDirection::Asc).unwrap(),
            "SELECT * FROM `Odd Kind`"
        );
        assert_eq!(build_query("", &[], "", SortDirection::Asc).unwrap(), "SELECT *");
    }

    #[test]
    fn test_validate_collects_every_error() {
        let clauses = vec![
            WhereClause::new(1, "age", Operator::Eq, ValueType::Integer, "x"),
            WhereClause::new(2, "ok", Operator::Eq, ValueType::String, "fine"),
            WhereClause::new(3, "active", Operator::Eq, ValueType::Boolean, "maybe"),
        ];
        let errors = validate_clauses(&clauses);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["age", "active"]);
    }

    #[test]
    fn test_spec_limit() {
        let spec = QuerySpec::new("Person").order_by("age", SortDirection::Asc).with_limit(10);
        assert_eq!(spec.build().unwrap(), "SELECT * FROM Person ORDER BY age ASC LIMIT 10");
    }

    #[test]
    fn test_build_queries_expands_in() {
        let spec = QuerySpec::new("Person").with_clauses(vec![
            WhereClause::new(1, "age", Operator::In, ValueType::Integer, "30, 40"),
            WhereClause::new(2, "name", Operator::Eq, ValueType::String, "Ada"),
        ]);
        let queries = build_queries(&spec).unwrap();
        assert_eq!(
            queries,
            vec![
                "SELECT * FROM Person WHERE name = 'Ada' AND age = 30",
                "SELECT * FROM Person WHERE name = 'Ada' AND age = 40",
            ]
        );
    }

    #[test]
    fn test_build_queries_rejects_invalid_clauses() {
        let spec = QuerySpec::new("Person").with_clauses(vec![
            WhereClause::new(1, "age", Operator::In, ValueType::Integer, "30, old"),
            WhereClause::new(2, "when", Operator::Eq, ValueType::Timestamp, ""),
        ]);
        let err = build_queries(&spec).unwrap_err();
        assert_eq!(err.clause_errors().len(), 2);
    }
}
