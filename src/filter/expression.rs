//! Boolean expressions over atomic conditions.
//!
//! The text is split on the whole word `OR` first and on `AND` second, at
//! every level, case-insensitively. Only a pair of parentheses wrapping the
//! entire text is removed, one layer per level; inner parentheses are not
//! tracked. `A AND B OR C` therefore reads as `(A AND B) OR C`.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::condition::{parse_condition, Condition};
use super::mask::Mask;
use crate::data::model::HerdDataset;

lazy_static! {
    static ref OR_SPLIT: Regex = Regex::new(r"(?i)\bOR\b").unwrap();
    static ref AND_SPLIT: Regex = Regex::new(r"(?i)\bAND\b").unwrap();
}

/// Parenthesis problems reported by [`check_parentheses`].
///
/// Evaluation never raises these; they are a lint for callers that want to
/// warn about text the splitter will read loosely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("unmatched ')' at byte {position}")]
    UnbalancedParentheses { position: usize },

    #[error("{count} unclosed '('")]
    UnclosedParentheses { count: usize },
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Leaf(Condition),
}

impl Expr {
    pub fn evaluate(&self, dataset: &HerdDataset) -> Mask {
        match self {
            Expr::Or(children) => children
                .iter()
                .fold(Mask::none(dataset.len()), |acc, child| {
                    acc.or(&child.evaluate(dataset))
                }),
            Expr::And(children) => children
                .iter()
                .fold(Mask::all(dataset.len()), |acc, child| {
                    acc.and(&child.evaluate(dataset))
                }),
            Expr::Leaf(cond) => cond.evaluate(dataset),
        }
    }

    /// Leaf conditions, left to right.
    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            Expr::Or(children) | Expr::And(children) => {
                children.iter().flat_map(Expr::conditions).collect()
            }
            Expr::Leaf(cond) => vec![cond],
        }
    }
}

/// Strip one outer `( ... )` layer when the text both starts and ends with
/// a parenthesis. Balance is not checked.
fn strip_outer_parens(text: &str) -> &str {
    let text = text.trim();
    match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => inner.trim(),
        None => text,
    }
}

/// Build the expression tree for `text`.
pub fn parse_expression(text: &str) -> Expr {
    let text = strip_outer_parens(text);

    let or_parts: Vec<&str> = OR_SPLIT.split(text).collect();
    if or_parts.len() > 1 {
        return Expr::Or(or_parts.into_iter().map(parse_expression).collect());
    }

    let and_parts: Vec<&str> = AND_SPLIT.split(text).collect();
    if and_parts.len() > 1 {
        return Expr::And(and_parts.into_iter().map(parse_expression).collect());
    }

    Expr::Leaf(parse_condition(text))
}

/// Evaluate the filter expression `text` over every row of `dataset`.
pub fn evaluate_expression(dataset: &HerdDataset, text: &str) -> Mask {
    parse_expression(text).evaluate(dataset)
}

/// Report the first parenthesis imbalance in `text`.
pub fn check_parentheses(text: &str) -> Result<(), ExpressionError> {
    let mut depth = 0usize;
    for (position, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ExpressionError::UnbalancedParentheses { position })?;
            }
            _ => {}
        }
    }
    if depth > 0 {
        return Err(ExpressionError::UnclosedParentheses { count: depth });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Record};

    fn herd(rows: &[(i64, i64, i64)]) -> HerdDataset {
        let records = rows
            .iter()
            .map(|&(dim, fcm, lac)| {
                Record::from_iter([
                    ("DIM", CellValue::Integer(dim)),
                    ("FCM", CellValue::Integer(fcm)),
                    ("LAC", CellValue::Integer(lac)),
                ])
            })
            .collect();
        HerdDataset::from_records(vec!["DIM".into(), "FCM".into(), "LAC".into()], records)
    }

    fn eval(ds: &HerdDataset, text: &str) -> Vec<bool> {
        evaluate_expression(ds, text).into()
    }

    #[test]
    fn test_range_and_comparison() {
        let ds = herd(&[(40, 35, 1), (80, 35, 1), (50, 20, 1)]);
        assert_eq!(
            eval(&ds, "30 <= DIM <= 70 AND FCM > 30"),
            vec![true, false, false]
        );
    }

    #[test]
    fn test_or_splits_before_and() {
        let ds = herd(&[
            (40, 35, 1),
            (40, 20, 3),
            (80, 35, 3),
            (80, 20, 1),
            (40, 20, 1),
        ]);
        let a = evaluate_expression(&ds, "DIM < 50");
        let b = evaluate_expression(&ds, "FCM > 30");
        let c = evaluate_expression(&ds, "LAC = 3");

        let combined = evaluate_expression(&ds, "DIM < 50 AND FCM > 30 OR LAC = 3");
        assert_eq!(combined, a.and(&b).or(&c));
        assert_eq!(combined.as_slice(), &[true, true, true, false, false]);
    }

    #[test]
    fn test_outer_parentheses_stripped() {
        let ds = herd(&[(40, 35, 1), (80, 35, 3), (50, 20, 2)]);
        assert_eq!(
            eval(&ds, "(30 <= DIM <= 70 AND FCM > 30) OR LAC = 3"),
            vec![true, true, false]
        );
        assert_eq!(eval(&ds, "  (LAC = 2)  "), vec![false, false, true]);
    }

    #[test]
    fn test_inner_parentheses_are_not_tracked() {
        let ds = herd(&[(40, 35, 1), (80, 35, 3)]);
        // the OR split cuts through the parentheses, leaving `(DIM < 50`
        // and `DIM > 70)`, which match nothing
        assert_eq!(eval(&ds, "LAC = 1 AND (DIM < 50 OR DIM > 70)"), vec![false, false]);
    }

    #[test]
    fn test_keywords_case_insensitive_whole_word() {
        let ds = herd(&[(40, 35, 1), (80, 35, 3)]);
        assert_eq!(eval(&ds, "LAC = 1 or LAC = 3"), vec![true, true]);
        assert_eq!(eval(&ds, "DIM > 30 and FCM = 35"), vec![true, true]);
        assert_eq!(
            parse_expression("COLOR = red"),
            Expr::Leaf(Condition::Equality {
                column: "COLOR".into(),
                value: "red".into(),
            })
        );
        assert!(matches!(parse_expression("BRAND = x"), Expr::Leaf(_)));
    }

    #[test]
    fn test_dangling_connective_matches_nothing() {
        let ds = herd(&[(40, 35, 1)]);
        assert_eq!(eval(&ds, "LAC = 1 OR"), vec![true]);
        assert_eq!(eval(&ds, "LAC = 1 AND"), vec![false]);
    }

    #[test]
    fn test_unknown_column_preserves_length() {
        let ds = herd(&[(40, 35, 1), (80, 35, 3), (50, 20, 2)]);
        assert_eq!(eval(&ds, "WEIGHT > 500"), vec![false; 3]);
        assert_eq!(eval(&ds, "WEIGHT > 500 OR LAC = 2"), vec![false, false, true]);
    }

    #[test]
    fn test_tree_shape() {
        let expr = parse_expression("A = 1 AND B = 2 OR C = 3");
        match &expr {
            Expr::Or(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(&children[0], Expr::And(inner) if inner.len() == 2));
                assert!(matches!(&children[1], Expr::Leaf(_)));
            }
            other => panic!("expected Or, got {other:?}"),
        }
        let columns: Vec<_> = expr.conditions().into_iter().filter_map(Condition::column).collect();
        assert_eq!(columns, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_check_parentheses() {
        assert_eq!(check_parentheses("(A = 1 AND B = 2) OR C = 3"), Ok(()));
        assert_eq!(
            check_parentheses("A = 1) OR (B = 2"),
            Err(ExpressionError::UnbalancedParentheses { position: 5 })
        );
        assert_eq!(
            check_parentheses("((A = 1"),
            Err(ExpressionError::UnclosedParentheses { count: 2 })
        );
    }
}
