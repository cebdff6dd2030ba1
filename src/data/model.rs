use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::filter::Mask;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a herd table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value. Column types are not fixed up front;
/// they are inferred on demand by the coercions below.
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

/// Text form of a cell, as used by categorical equality and CSV export.
/// `Null` renders as the empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{}", format_float(*v)),
            CellValue::Bool(true) => write!(f, "True"),
            CellValue::Bool(false) => write!(f, "False"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Numeric coercion used by range, list and comparison conditions.
    ///
    /// Text is parsed after trimming; booleans count as 1 / 0. Anything that
    /// does not yield a real number (including NaN) is `None`, which every
    /// numeric condition treats as "not satisfying".
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::Bool(b) => f64::from(u8::from(*b)),
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Null => return None,
        };
        (!v.is_nan()).then_some(v)
    }

    /// Text form for equality matching; missing values have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Missing or empty-string cell.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// Shortest round-trip text of a float. Whole values keep their decimal
/// point (`3.0`); exponents carry a sign and at least two digits (`1e+16`,
/// `1.5e-07`).
fn format_float(v: f64) -> String {
    // Debug gives `3.0` and switches to `1e16` / `1.5e-7` outside [1e-4, 1e16)
    let text = format!("{v:?}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

static NULL_CELL: CellValue = CellValue::Null;

// ---------------------------------------------------------------------------
// Record – one row of the herd table
// ---------------------------------------------------------------------------

/// A single herd record (one row of the source table).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Dynamic columns: column_name → value.
    pub values: BTreeMap<String, CellValue>,
}

impl Record {
    /// Value of `column`, reading an absent column as `Null`.
    pub fn get(&self, column: &str) -> &CellValue {
        self.values.get(column).unwrap_or(&NULL_CELL)
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Record {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – coarse column classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-missing value is `true` / `false`.
    Boolean,
    /// Every non-missing value is an integer or float.
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Boolean => write!(f, "boolean"),
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

// ---------------------------------------------------------------------------
// HerdDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed column indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HerdDataset {
    /// All records (rows), in source order.
    pub records: Vec<Record>,
    /// Ordered list of column names (source header order).
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
}

impl HerdDataset {
    /// Build column indices from the loaded records.
    ///
    /// `column_names` fixes the column order; columns that only appear in
    /// the records are appended in sorted order. Every record is filled up
    /// to the full column set with `Null`.
    pub fn from_records(column_names: Vec<String>, mut records: Vec<Record>) -> Self {
        let mut column_names = column_names;
        let known: BTreeSet<String> = column_names.iter().cloned().collect();
        let extra: BTreeSet<String> = records
            .iter()
            .flat_map(|r| r.values.keys())
            .filter(|c| !known.contains(*c))
            .cloned()
            .collect();
        column_names.extend(extra);

        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = BTreeMap::new();
        for record in &mut records {
            for col in &column_names {
                let val = record
                    .values
                    .entry(col.clone())
                    .or_insert(CellValue::Null);
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }

        HerdDataset {
            records,
            column_names,
            unique_values,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.unique_values.contains_key(column) || self.column_names.iter().any(|c| c == column)
    }

    /// Values of one column in row order.
    pub fn column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> + 'a {
        self.records.iter().map(move |r| r.get(column))
    }

    /// Numeric view of a column, `None` per cell where coercion fails.
    /// Returns `None` when the column does not exist.
    pub fn numeric_column(&self, column: &str) -> Option<Vec<Option<f64>>> {
        if !self.has_column(column) {
            return None;
        }
        Some(self.column(column).map(CellValue::as_f64).collect())
    }

    /// Non-missing unique values of a column.
    fn present_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a CellValue> + 'a {
        self.unique_values
            .get(column)
            .into_iter()
            .flatten()
            .filter(|v| !v.is_null())
    }

    /// Whether every non-missing value of `column` is a boolean.
    /// A column with no values at all qualifies.
    ///
    /// Only `Bool` cells count: 0/1 integer or 0.0/1.0 float flag columns
    /// are numeric here, even though a dataframe set test comparing against
    /// `{True, False}` would accept them.
    pub fn is_bool_like(&self, column: &str) -> bool {
        self.has_column(column)
            && self
                .present_values(column)
                .all(|v| matches!(v, CellValue::Bool(_)))
    }

    pub fn column_kind(&self, column: &str) -> ColumnKind {
        if self.is_bool_like(column) {
            ColumnKind::Boolean
        } else if self
            .present_values(column)
            .all(|v| matches!(v, CellValue::Integer(_) | CellValue::Float(_)))
        {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }

    /// Records where `mask` is true, in their original order.
    pub fn select(&self, mask: &Mask) -> HerdDataset {
        let records = self
            .records
            .iter()
            .zip(mask.iter())
            .filter(|(_, keep)| *keep)
            .map(|(r, _)| r.clone())
            .collect();
        HerdDataset::from_records(self.column_names.clone(), records)
    }

    /// Records at the given row indices, in the order given.
    pub fn select_indices(&self, indices: &[usize]) -> HerdDataset {
        let records = indices
            .iter()
            .filter_map(|&i| self.records.get(i).cloned())
            .collect();
        HerdDataset::from_records(self.column_names.clone(), records)
    }
}
