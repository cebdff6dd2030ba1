use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::mask::Mask;
use crate::data::model::{CellValue, HerdDataset};

// ---------------------------------------------------------------------------
// Toggles for boolean-like columns
// ---------------------------------------------------------------------------

/// Which states of a boolean-like column are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoolToggle {
    pub include_true: bool,
    pub include_blank: bool,
}

impl Default for BoolToggle {
    fn default() -> Self {
        Self {
            include_true: true,
            include_blank: true,
        }
    }
}

/// Per-column toggle state: maps column_name → toggle.
pub type BoolColumnFilterSpec = BTreeMap<String, BoolToggle>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("column '{0}' is not a boolean column")]
    NotBooleanColumn(String),
}

/// Columns whose non-missing values are all `true` / `false`, in column order.
pub fn detect_bool_columns(dataset: &HerdDataset) -> Vec<String> {
    dataset
        .column_names
        .iter()
        .filter(|col| dataset.is_bool_like(col))
        .cloned()
        .collect()
}

/// Initialise a [`BoolColumnFilterSpec`] with every state included.
pub fn default_bool_spec(dataset: &HerdDataset) -> BoolColumnFilterSpec {
    detect_bool_columns(dataset)
        .into_iter()
        .map(|col| (col, BoolToggle::default()))
        .collect()
}

/// Mask of rows passing every column toggle in `spec`.
///
/// A row passes a column when:
/// * `include_true` is set and the cell is `true`, or
/// * `include_blank` is set and the cell is missing or empty.
///
/// `false` cells never pass, and a column with both flags cleared hides
/// every row.
pub fn apply_bool_filters(dataset: &HerdDataset, spec: &BoolColumnFilterSpec) -> Mask {
    dataset
        .records
        .iter()
        .map(|record| {
            spec.iter().all(|(col, toggle)| {
                let cell = record.get(col);
                (toggle.include_true && *cell == CellValue::Bool(true))
                    || (toggle.include_blank && cell.is_blank())
            })
        })
        .collect()
}
