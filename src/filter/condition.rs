//! Atomic conditions: recognising one condition shape and matching it
//! against a dataset.
//!
//! Shapes are tried in a fixed order and the first whole-text match wins:
//!
//! | shape           | example                  |
//! |-----------------|--------------------------|
//! | exclusion list  | `EART != 20017, 20022`   |
//! | inclusion list  | `LAC = 1, 2`             |
//! | range           | `30 <= DIM <= 70`        |
//! | comparison      | `FCM > 30`               |
//! | equality        | `BREED = Holstein`       |
//!
//! Anything else, and any shape naming an unknown column, matches no rows.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use super::mask::Mask;
use crate::data::model::HerdDataset;

/// A plain number literal: optional sign, digits with an optional decimal point.
const NUMBER: &str = r"-?(?:\d+\.?\d*|\.\d+)";

lazy_static! {
    static ref EXCLUSION_LIST: Regex =
        Regex::new(&format!(r"^(\w+)\s*!=\s*({NUMBER}(?:\s*,\s*{NUMBER})*)$")).unwrap();
    static ref INCLUSION_LIST: Regex =
        Regex::new(&format!(r"^(\w+)\s*=\s*({NUMBER}(?:\s*,\s*{NUMBER})*)$")).unwrap();
    static ref RANGE: Regex =
        Regex::new(&format!(r"^({NUMBER})\s*<=\s*(\w+)\s*<=\s*({NUMBER})$")).unwrap();
    // two-character operators first so `>=` is never read as `>`
    static ref COMPARISON: Regex =
        Regex::new(&format!(r"^(\w+)\s*(>=|<=|!=|=|>|<)\s*({NUMBER})$")).unwrap();
    static ref EQUALITY: Regex = Regex::new(r"^(\w+)\s*=\s*(.+)$").unwrap();
}

// ---------------------------------------------------------------------------
// Comparison operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(CompareOp::Gt),
            "<" => Some(CompareOp::Lt),
            ">=" => Some(CompareOp::Ge),
            "<=" => Some(CompareOp::Le),
            "=" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
        }
    }

    pub fn evaluate(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Gt => lhs > rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
        }
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// One atomic predicate over a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `low <= column <= high`, inclusive both ends.
    Range { column: String, low: f64, high: f64 },
    /// Numeric set membership, or its complement when `negate` is set.
    List {
        column: String,
        values: Vec<f64>,
        negate: bool,
    },
    Comparison {
        column: String,
        op: CompareOp,
        value: f64,
    },
    /// Equality against the text form of each cell.
    Equality { column: String, value: String },
    /// Text that fits no shape. Matches nothing.
    Unmatched(String),
}

impl Condition {
    /// Column this condition reads, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Condition::Range { column, .. }
            | Condition::List { column, .. }
            | Condition::Comparison { column, .. }
            | Condition::Equality { column, .. } => Some(column),
            Condition::Unmatched(_) => None,
        }
    }

    /// Evaluate against every row. Unknown columns and unmatched text give
    /// an all-false mask; cells that do not coerce to a number never satisfy
    /// a numeric shape.
    pub fn evaluate(&self, dataset: &HerdDataset) -> Mask {
        match self {
            Condition::Range { column, low, high } => {
                numeric_mask(dataset, column, |v| *low <= v && v <= *high)
            }
            Condition::List {
                column,
                values,
                negate,
            } => numeric_mask(dataset, column, |v| values.contains(&v) != *negate),
            Condition::Comparison { column, op, value } => {
                numeric_mask(dataset, column, |v| op.evaluate(v, *value))
            }
            Condition::Equality { column, value } => {
                if !dataset.has_column(column) {
                    log::debug!("condition references unknown column '{column}'");
                    return Mask::none(dataset.len());
                }
                dataset
                    .column(column)
                    .map(|cell| cell.as_text().is_some_and(|text| text == *value))
                    .collect()
            }
            Condition::Unmatched(raw) => {
                log::debug!("unrecognised condition '{raw}'");
                Mask::none(dataset.len())
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Range { column, low, high } => write!(f, "{low} <= {column} <= {high}"),
            Condition::List {
                column,
                values,
                negate,
            } => {
                let op = if *negate { "!=" } else { "=" };
                let list: Vec<String> = values.iter().map(f64::to_string).collect();
                write!(f, "{column} {op} {}", list.join(", "))
            }
            Condition::Comparison { column, op, value } => {
                write!(f, "{column} {} {value}", op.symbol())
            }
            Condition::Equality { column, value } => write!(f, "{column} = {value}"),
            Condition::Unmatched(raw) => write!(f, "{raw}"),
        }
    }
}

fn numeric_mask(dataset: &HerdDataset, column: &str, pred: impl Fn(f64) -> bool) -> Mask {
    match dataset.numeric_column(column) {
        Some(values) => values.into_iter().map(|v| v.is_some_and(&pred)).collect(),
        None => {
            log::debug!("condition references unknown column '{column}'");
            Mask::none(dataset.len())
        }
    }
}

// ---------------------------------------------------------------------------
// Shape matchers, tried in priority order
// ---------------------------------------------------------------------------

type ShapeMatcher = fn(&str) -> Option<Condition>;

const SHAPES: [ShapeMatcher; 5] = [
    match_exclusion_list,
    match_inclusion_list,
    match_range,
    match_comparison,
    match_equality,
];

/// Recognise the shape of one atomic condition. Never fails: text that
/// fits no shape becomes [`Condition::Unmatched`].
pub fn parse_condition(text: &str) -> Condition {
    let text = text.trim();
    SHAPES
        .iter()
        .find_map(|shape| shape(text))
        .unwrap_or_else(|| Condition::Unmatched(text.to_string()))
}

/// Parse `text` as one atomic condition and evaluate it over `dataset`.
pub fn match_condition(dataset: &HerdDataset, text: &str) -> Mask {
    parse_condition(text).evaluate(dataset)
}

fn parse_number_list(list: &str) -> Option<Vec<f64>> {
    list.split(',')
        .map(|v| v.trim().parse::<f64>().ok())
        .collect()
}

fn match_list(re: &Regex, text: &str, negate: bool) -> Option<Condition> {
    let caps = re.captures(text)?;
    Some(Condition::List {
        column: caps[1].to_string(),
        values: parse_number_list(&caps[2])?,
        negate,
    })
}

fn match_exclusion_list(text: &str) -> Option<Condition> {
    match_list(&EXCLUSION_LIST, text, true)
}

fn match_inclusion_list(text: &str) -> Option<Condition> {
    match_list(&INCLUSION_LIST, text, false)
}

fn match_range(text: &str) -> Option<Condition> {
    let caps = RANGE.captures(text)?;
    Some(Condition::Range {
        column: caps[2].to_string(),
        low: caps[1].parse().ok()?,
        high: caps[3].parse().ok()?,
    })
}

fn match_comparison(text: &str) -> Option<Condition> {
    let caps = COMPARISON.captures(text)?;
    Some(Condition::Comparison {
        column: caps[1].to_string(),
        op: CompareOp::from_symbol(&caps[2])?,
        value: caps[3].parse().ok()?,
    })
}

fn match_equality(text: &str) -> Option<Condition> {
    let caps = EQUALITY.captures(text)?;
    Some(Condition::Equality {
        column: caps[1].to_string(),
        value: caps[2].trim().to_string(),
    })
}
