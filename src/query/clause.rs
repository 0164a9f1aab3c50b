//! Structured filter clauses
//!
//! Clause lists are edited by value replacement: every edit returns a new
//! list and leaves the original untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::ValueType;

use super::errors::ClauseError;

/// Field every `HAS ANCESTOR` clause filters on
pub const KEY_FIELD: &str = "__key__";

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "HAS ANCESTOR")]
    HasAncestor,
}

impl Operator {
    /// Query keyword for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::HasAncestor => "HAS ANCESTOR",
        }
    }

    /// Returns true if the clause value is a comma-separated list
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ClauseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        let op = match normalized.as_str() {
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            "HAS ANCESTOR" => Operator::HasAncestor,
            _ => return Err(ClauseError::new("operator", format!("unknown operator '{}'", s))),
        };
        Ok(op)
    }
}

/// Sort direction of the `ORDER BY` suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ClauseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(ClauseError::new("direction", format!("unknown direction '{}'", s))),
        }
    }
}

/// One structured filter condition prior to rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereClause {
    /// Unique within its `ClauseList`
    #[serde(default)]
    pub id: u32,
    pub field: String,
    pub operator: Operator,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub value: String,
}

impl WhereClause {
    /// Create a clause; `HAS ANCESTOR` forces the key field and type
    pub fn new(
        id: u32,
        field: impl Into<String>,
        operator: Operator,
        value_type: ValueType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id,
            field: field.into(),
            operator,
            value_type,
            value: value.into(),
        }
        .normalized()
    }

    /// Applies the `HAS ANCESTOR` field/type invariant
    pub fn normalized(mut self) -> Self {
        if self.operator == Operator::HasAncestor {
            self.field = KEY_FIELD.to_string();
            self.value_type = ValueType::Key;
        }
        self
    }

    /// Skipped by the assembler; `HAS ANCESTOR` always targets `__key__`
    pub fn is_blank(&self) -> bool {
        self.operator != Operator::HasAncestor && self.field.trim().is_empty()
    }

    /// Trimmed, non-empty elements of a list value
    pub fn list_values(&self) -> Vec<&str> {
        split_list(&self.value)
    }
}

/// Splits a comma-separated list, trimming and dropping empty elements
pub fn split_list(text: &str) -> Vec<&str> {
    text.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// Immutable, ordered list of clauses with unique ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClauseList {
    clauses: Vec<WhereClause>,
}

impl ClauseList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[WhereClause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&WhereClause> {
        self.clauses.iter().find(|c| c.id == id)
    }

    /// Id the next appended clause will receive
    ///
    /// Normally `max(id) + 1`. Once `u32::MAX` is taken, the lowest unused
    /// id is handed out instead.
    pub fn next_id(&self) -> u32 {
        let max = self.clauses.iter().map(|c| c.id).max().unwrap_or(0);
        match max.checked_add(1) {
            Some(id) => id,
            None => (1..=u32::MAX)
                .find(|id| self.get(*id).is_none())
                .unwrap_or(u32::MAX),
        }
    }

    /// Returns a new list with a clause appended under a fresh id
    pub fn with_clause(
        &self,
        field: impl Into<String>,
        operator: Operator,
        value_type: ValueType,
        value: impl Into<String>,
    ) -> Self {
        let clause = WhereClause::new(self.next_id(), field, operator, value_type, value);
        let mut clauses = self.clauses.clone();
        clauses.push(clause);
        Self { clauses }
    }

    /// Returns a new list with clause `id` replaced by `update(clause)`
    ///
    /// The id is preserved and the result is normalized. Unknown ids leave
    /// the list unchanged.
    pub fn with_updated(&self, id: u32, update: impl FnOnce(WhereClause) -> WhereClause) -> Self {
        let mut clauses = self.clauses.clone();
        if let Some(slot) = clauses.iter_mut().find(|c| c.id == id) {
            let mut updated = update(slot.clone());
            updated.id = id;
            *slot = updated.normalized();
        }
        Self { clauses }
    }

    /// Returns a new list with clause `id` switched to `operator`
    pub fn with_operator(&self, id: u32, operator: Operator) -> Self {
        self.with_updated(id, |mut c| {
            c.operator = operator;
            c
        })
    }

    /// Returns a new list without clause `id`
    pub fn without(&self, id: u32) -> Self {
        Self {
            clauses: self.clauses.iter().filter(|c| c.id != id).cloned().collect(),
        }
    }
}

impl From<Vec<WhereClause>> for ClauseList {
    /// Normalizes every clause and renumbers duplicate ids
    fn from(clauses: Vec<WhereClause>) -> Self {
        let mut list = ClauseList::new();
        for clause in clauses {
            let mut clause = clause.normalized();
            if list.get(clause.id).is_some() || clause.id == 0 {
                clause.id = list.next_id();
            }
            list.clauses.push(clause);
        }
        list
    }
}

impl From<ClauseList> for Vec<WhereClause> {
    fn from(list: ClauseList) -> Self {
        list.clauses
    }
}
