//! Aggregation over fetched rows
//!
//! Post-hoc reduction of a result set to one number. `count` ignores the
//! field; the other operations only see integer and double values of the
//! field and skip everything else. An empty numeric subset yields `None`,
//! which renders as `n/a` rather than a misleading zero.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};
use crate::value::Entity;

/// Rendering of an absent aggregate
pub const NO_VALUE: &str = "n/a";

/// Supported reductions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown aggregation '{0}' (expected count, sum, avg, min or max)")]
pub struct UnknownAggregation(pub String);

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Count => "count",
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        }
    }

    /// Reduces `rows` over `field`
    pub fn evaluate(&self, rows: &[Entity], field: &str) -> Option<f64> {
        let result = match self {
            Aggregation::Count => Some(rows.len() as f64),
            _ => {
                let numbers: Vec<f64> = rows
                    .iter()
                    .filter_map(|row| row.get(field))
                    .filter_map(|value| value.as_f64())
                    .collect();
                self.reduce(&numbers)
            }
        };

        let display = format_aggregate(result);
        let row_count = rows.len().to_string();
        log_event_with_fields(
            Event::AggregateComputed,
            &[
                ("op", self.as_str()),
                ("field", field),
                ("rows", row_count.as_str()),
                ("value", display.as_str()),
            ],
        );

        result
    }

    fn reduce(&self, numbers: &[f64]) -> Option<f64> {
        if numbers.is_empty() {
            return None;
        }
        match self {
            Aggregation::Count => Some(numbers.len() as f64),
            Aggregation::Sum => Some(numbers.iter().sum()),
            Aggregation::Avg => Some(numbers.iter().sum::<f64>() / numbers.len() as f64),
            Aggregation::Min => numbers.iter().copied().reduce(f64::min),
            Aggregation::Max => numbers.iter().copied().reduce(f64::max),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = UnknownAggregation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Aggregation::Count),
            "sum" => Ok(Aggregation::Sum),
            "avg" | "average" => Ok(Aggregation::Avg),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            _ => Err(UnknownAggregation(s.trim().to_string())),
        }
    }
}

/// Shorthand for `op.evaluate(rows, field)`
pub fn evaluate(op: Aggregation, rows: &[Entity], field: &str) -> Option<f64> {
    op.evaluate(rows, field)
}

/// Renders an aggregate for display
pub fn format_aggregate(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => NO_VALUE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Key, PropertyValue};

    fn row(id: i64) -> Entity {
        Entity::new(Key::root("p", "Item", id))
    }

    fn sample() -> Vec<Entity> {
        vec![
            row(1).with_property("price", 10i64),
            row(2).with_property("price", 4.5),
            row(3),
        ]
    }

    #[test]
    fn test_sum_skips_absent() {
        assert_eq!(Aggregation::Sum.evaluate(&sample(), "price"), Some(14.5));
    }

    #[test]
    fn test_count_ignores_field() {
        assert_eq!(Aggregation::Count.evaluate(&sample(), "nothing"), Some(3.0));
        assert_eq!(Aggregation::Count.evaluate(&[], "price"), Some(0.0));
    }

    #[test]
    fn test_avg_min_max() {
        let rows = sample();
        assert_eq!(Aggregation::Avg.evaluate(&rows, "price"), Some(7.25));
        assert_eq!(Aggregation::Min.evaluate(&rows, "price"), Some(4.5));
        assert_eq!(Aggregation::Max.evaluate(&rows, "price"), Some(10.0));
    }

    #[test]
    fn test_empty_numeric_subset_is_none() {
        let rows = vec![
            row(1).with_property("price", "cheap"),
            row(2).with_property("price", PropertyValue::Null),
        ];
        assert_eq!(Aggregation::Avg.evaluate(&rows, "price"), None);
        assert_eq!(Aggregation::Sum.evaluate(&[], "price"), None);
        assert_eq!(format_aggregate(None), "n/a");
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("AVG".parse::<Aggregation>().unwrap(), Aggregation::Avg);
        assert_eq!(Aggregation::Max.to_string(), "max");
        assert!("median".parse::<Aggregation>().is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_aggregate(Some(14.5)), "14.5");
        assert_eq!(format_aggregate(Some(3.0)), "3");
    }
}
