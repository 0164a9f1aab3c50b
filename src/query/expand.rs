//! IN-clause expansion
//!
//! The store evaluates each query variant independently, so a clause set with
//! `IN` filters is expanded into the cartesian product of its values, one `=`
//! clause per value. The number of variants is capped.

use super::clause::{Operator, WhereClause};
use super::errors::{ClauseError, QueryError, QueryResult};

/// Hard limit on the number of expanded query variants
pub const MAX_COMBINATIONS: usize = 50;

/// Expands `IN` clauses into independent clause lists
///
/// Non-`IN` clauses come first in every combination, in source order,
/// followed by one `=` clause per `IN` clause. Without `IN` clauses the
/// result is a single combination.
pub fn expand_in_clauses(clauses: &[WhereClause]) -> QueryResult<Vec<Vec<WhereClause>>> {
    let (in_clauses, fixed): (Vec<&WhereClause>, Vec<&WhereClause>) = clauses
        .iter()
        .partition(|c| c.operator == Operator::In && !c.is_blank());

    let mut combinations: Vec<Vec<WhereClause>> = vec![fixed.into_iter().cloned().collect()];

    for clause in in_clauses {
        let values = clause.list_values();
        if values.is_empty() {
            return Err(ClauseError::new(&clause.field, "IN requires at least one value").into());
        }

        let count = combinations.len() * values.len();
        if count > MAX_COMBINATIONS {
            return Err(QueryError::TooManyCombinations {
                count,
                cap: MAX_COMBINATIONS,
            });
        }

        combinations = combinations
            .iter()
            .flat_map(|combo| {
                values.iter().map(move |value| {
                    let mut next = combo.clone();
                    next.push(WhereClause {
                        operator: Operator::Eq,
                        value: (*value).to_string(),
                        ..clause.clone()
                    });
                    next
                })
            })
            .collect();
    }

    Ok(combinations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    fn clause(id: u32, field: &str, op: Operator, value: &str) -> WhereClause {
        WhereClause::new(id, field, op, ValueType::Integer, value)
    }

    #[test]
    fn test_no_in_clauses_is_one_combination() {
        let clauses = vec![clause(1, "age", Operator::Gt, "30")];
        let combos = expand_in_clauses(&clauses).unwrap();
        assert_eq!(combos, vec![clauses]);
    }

    #[test]
    fn test_empty_input() {
        let combos = expand_in_clauses(&[]).unwrap();
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn test_cartesian_product() {
        let clauses = vec![
            clause(1, "a", Operator::In, "1, 2"),
            clause(2, "fixed", Operator::Eq, "0"),
            clause(3, "b", Operator::In, "3,4,5"),
        ];
        let combos = expand_in_clauses(&clauses).unwrap();
        assert_eq!(combos.len(), 6);

        for combo in &combos {
            assert_eq!(combo.len(), 3);
            assert_eq!(combo[0].field, "fixed");
            assert!(combo.iter().all(|c| c.operator == Operator::Eq));
        }
        assert_eq!(combos[0][1].value, "1");
        assert_eq!(combos[0][2].value, "3");
        assert_eq!(combos[5][1].value, "2");
        assert_eq!(combos[5][2].value, "5");
    }

    #[test]
    fn test_cap_is_enforced() {
        let values: Vec<String> = (0..51).map(|i| i.to_string()).collect();
        let clauses = vec![clause(1, "a", Operator::In, &values.join(","))];
        let err = expand_in_clauses(&clauses).unwrap_err();
        assert_eq!(err, QueryError::TooManyCombinations { count: 51, cap: 50 });
    }

    #[test]
    fn test_cap_allows_exactly_fifty() {
        let clauses = vec![
            clause(1, "a", Operator::In, "1,2,3,4,5"),
            clause(2, "b", Operator::In, "1,2,3,4,5,6,7,8,9,10"),
        ];
        assert_eq!(expand_in_clauses(&clauses).unwrap().len(), 50);
    }

    #[test]
    fn test_not_in_is_not_expanded() {
        let clauses = vec![clause(1, "a", Operator::NotIn, "1, 2")];
        let combos = expand_in_clauses(&clauses).unwrap();
        assert_eq!(combos, vec![clauses]);
    }

    #[test]
    fn test_empty_in_clause_is_an_error() {
        let clauses = vec![clause(1, "a", Operator::In, " , ")];
        let err = expand_in_clauses(&clauses).unwrap_err();
        assert_eq!(err.clause_errors()[0].field, "a");
    }
}
