//! Query literal builder
//!
//! Turns the raw text of one clause into a query-literal token according to
//! its declared type. Validation failures name the clause's field.

use std::sync::OnceLock;

use regex::Regex;

use crate::value::{double_quote, single_quote, ValueType};

use super::clause::{Operator, WhereClause, KEY_FIELD};
use super::errors::ClauseError;

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?\d+$").expect("integer pattern is valid"))
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)key\s*\(").expect("key pattern is valid"))
}

/// Builds the single literal of a scalar clause
///
/// `HAS ANCESTOR` always takes the key path regardless of the stored type.
pub fn build_literal(clause: &WhereClause) -> Result<String, ClauseError> {
    if clause.operator == Operator::HasAncestor {
        return literal_for(KEY_FIELD, ValueType::Key, &clause.value);
    }
    literal_for(&clause.field, clause.value_type, &clause.value)
}

/// Builds one literal per element of an `IN` / `NOT IN` clause
pub fn build_list_literals(clause: &WhereClause) -> Result<Vec<String>, ClauseError> {
    if clause.value_type == ValueType::Null {
        return Err(ClauseError::new(
            &clause.field,
            format!("{} does not accept null; use raw instead", clause.operator),
        ));
    }

    let literals = clause
        .list_values()
        .into_iter()
        .map(|item| literal_for(&clause.field, clause.value_type, item))
        .collect::<Result<Vec<_>, _>>()?;

    if literals.is_empty() {
        return Err(ClauseError::new(
            &clause.field,
            format!("{} requires at least one value", clause.operator),
        ));
    }
    Ok(literals)
}

/// Validates and escapes one value of the declared type
pub fn literal_for(field: &str, value_type: ValueType, raw: &str) -> Result<String, ClauseError> {
    let trimmed = raw.trim();
    let fail = |message: String| Err(ClauseError::new(field, message));

    match value_type {
        ValueType::String => Ok(single_quote(raw)),
        ValueType::Integer => {
            if integer_pattern().is_match(trimmed) {
                Ok(trimmed.to_string())
            } else {
                fail(format!("'{}' is not an integer", trimmed))
            }
        }
        ValueType::Double => match trimmed.parse::<f64>() {
            Ok(d) if d.is_finite() => Ok(d.to_string()),
            _ => fail(format!("'{}' is not a finite number", trimmed)),
        },
        ValueType::Boolean => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok("true".to_string())
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok("false".to_string())
            } else {
                fail(format!("'{}' is not true or false", trimmed))
            }
        }
        ValueType::Null => Ok("NULL".to_string()),
        ValueType::Timestamp => {
            if trimmed.is_empty() {
                fail("timestamp must not be empty".to_string())
            } else {
                Ok(format!("DATETIME({})", double_quote(trimmed)))
            }
        }
        ValueType::Key => {
            if key_pattern().is_match(trimmed) {
                Ok(raw.to_string())
            } else {
                fail(format!("'{}' is not a KEY(...) literal", trimmed))
            }
        }
        ValueType::Blob => {
            if trimmed.is_empty() {
                fail("blob must not be empty".to_string())
            } else {
                Ok(format!("BLOB({})", double_quote(trimmed)))
            }
        }
        ValueType::GeoPoint => geo_point_literal(trimmed).ok_or_else(|| {
            ClauseError::new(
                field,
                format!("'{}' is not a 'latitude, longitude' pair", trimmed),
            )
        }),
        ValueType::Array | ValueType::Entity | ValueType::Raw => {
            if trimmed.is_empty() {
                fail(format!("{} value must not be empty", value_type))
            } else {
                Ok(raw.to_string())
            }
        }
    }
}

fn geo_point_literal(text: &str) -> Option<String> {
    let mut parts = text.split(',');
    let lat = finite(parts.next()?)?;
    let lon = finite(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(format!("GEOPT({}, {})", lat, lon))
}

fn finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|d| d.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(ty: ValueType, raw: &str) -> Result<String, ClauseError> {
        literal_for("f", ty, raw)
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(lit(ValueType::String, "O'Brien\\").unwrap(), "'O\\'Brien\\\\'");
        assert_eq!(lit(ValueType::String, " spaced ").unwrap(), "' spaced '");
    }

    #[test]
    fn test_integer() {
        assert_eq!(lit(ValueType::Integer, " -42 ").unwrap(), "-42");
        assert!(lit(ValueType::Integer, "4.2").is_err());
        assert!(lit(ValueType::Integer, "").is_err());
    }

    #[test]
    fn test_double() {
        assert_eq!(lit(ValueType::Double, "30.0").unwrap(), "30");
        assert_eq!(lit(ValueType::Double, "4.50").unwrap(), "4.5");
        assert!(lit(ValueType::Double, "inf").is_err());
        assert!(lit(ValueType::Double, "abc").is_err());
    }

    #[test]
    fn test_double_extremes_render_positionally() {
        let huge = format!("1{}", "0".repeat(300));
        assert_eq!(lit(ValueType::Double, "1e300").unwrap(), huge);
        assert_eq!(lit(ValueType::Double, "1e-7").unwrap(), "0.0000001");
        assert_eq!(lit(ValueType::Double, "-2.5E3").unwrap(), "-2500");
        assert_eq!(
            lit(ValueType::GeoPoint, "1e-7, 1e2").unwrap(),
            "GEOPT(0.0000001, 100)"
        );
    }

    #[test]
    fn test_boolean() {
        assert_eq!(lit(ValueType::Boolean, " TRUE").unwrap(), "true");
        assert!(lit(ValueType::Boolean, "yes").is_err());
    }

    #[test]
    fn test_wrapped_literals() {
        assert_eq!(
            lit(ValueType::Timestamp, " 2024-01-01T00:00:00Z ").unwrap(),
            "DATETIME(\"2024-01-01T00:00:00Z\")"
        );
        assert_eq!(lit(ValueType::Blob, "a\"b").unwrap(), "BLOB(\"a\\\"b\")");
        assert!(lit(ValueType::Timestamp, "  ").is_err());
        assert!(lit(ValueType::Blob, "").is_err());
    }

    #[test]
    fn test_key_passthrough() {
        assert_eq!(lit(ValueType::Key, "key (Org, 'acme')").unwrap(), "key (Org, 'acme')");
        assert!(lit(ValueType::Key, "Org, 'acme'").is_err());
    }

    #[test]
    fn test_geo_point() {
        assert_eq!(lit(ValueType::GeoPoint, "1.5, -2").unwrap(), "GEOPT(1.5, -2)");
        assert!(lit(ValueType::GeoPoint, "1.5").is_err());
        assert!(lit(ValueType::GeoPoint, "1,2,3").is_err());
        assert!(lit(ValueType::GeoPoint, "north, 2").is_err());
    }

    #[test]
    fn test_raw_passthrough() {
        assert_eq!(lit(ValueType::Raw, "ARRAY(1, 2)").unwrap(), "ARRAY(1, 2)");
        assert!(lit(ValueType::Array, " ").is_err());
    }

    #[test]
    fn test_error_names_field() {
        let err = literal_for("age", ValueType::Integer, "old").unwrap_err();
        assert_eq!(err.field, "age");
    }

    #[test]
    fn test_has_ancestor_ignores_stored_type() {
        let clause = WhereClause {
            id: 1,
            field: "owner".to_string(),
            operator: Operator::HasAncestor,
            value_type: ValueType::String,
            value: "KEY(Org, 'acme')".to_string(),
        };
        assert_eq!(build_literal(&clause).unwrap(), "KEY(Org, 'acme')");
    }

    #[test]
    fn test_list_literals() {
        let clause = WhereClause::new(1, "age", Operator::In, ValueType::Integer, " 1, ,2 ,3");
        assert_eq!(build_list_literals(&clause).unwrap(), vec!["1", "2", "3"]);

        let bad = WhereClause::new(1, "age", Operator::In, ValueType::Integer, "1, x");
        assert_eq!(build_list_literals(&bad).unwrap_err().field, "age");

        let empty = WhereClause::new(1, "age", Operator::In, ValueType::Integer, " , ");
        assert!(build_list_literals(&empty).is_err());

        let null = WhereClause::new(1, "age", Operator::In, ValueType::Null, "NULL");
        assert!(build_list_literals(&null).is_err());
    }
}
