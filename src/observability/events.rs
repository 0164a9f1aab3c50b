//! Observable events
//!
//! Events are explicit and typed; the string form is the `event` field of a log line.

use std::fmt;

/// Observable events of a browse run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Query construction
    /// One query string rendered
    QueryBuilt,
    /// IN clauses expanded into several variants
    QueryVariantsExpanded,
    /// Clauses failed validation or expansion was capped
    QueryRejected,

    // Execution
    /// All variants executed and rows concatenated
    QueryExecuted,
    /// A variant failed; the whole run failed
    QueryFailed,

    // Joins
    /// Batched key lookup issued
    JoinLookup,
    /// Fetched rows merged back into the result set
    JoinResolved,
    /// Some configured references matched no fetched row
    JoinUnresolved,

    // Aggregation
    /// Aggregate computed over the final rows
    AggregateComputed,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueryBuilt => "QUERY_BUILT",
            Event::QueryVariantsExpanded => "QUERY_VARIANTS_EXPANDED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryFailed => "QUERY_FAILED",
            Event::JoinLookup => "JOIN_LOOKUP",
            Event::JoinResolved => "JOIN_RESOLVED",
            Event::JoinUnresolved => "JOIN_UNRESOLVED",
            Event::AggregateComputed => "AGGREGATE_COMPUTED",
        }
    }

    /// Events that report a failure of the run
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::QueryFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::QueryVariantsExpanded.as_str(), "QUERY_VARIANTS_EXPANDED");
        assert_eq!(Event::JoinUnresolved.to_string(), "JOIN_UNRESOLVED");
    }

    #[test]
    fn test_failure_events() {
        assert!(Event::QueryFailed.is_failure());
        assert!(!Event::QueryExecuted.is_failure());
    }
}
