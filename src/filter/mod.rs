//! Row selection: expression text and boolean-column toggles → mask.
//!
//! ```text
//!   "30 <= DIM <= 70 AND FCM > 30"
//!        │
//!        ▼
//!   ┌────────────┐
//!   │ expression │  split on OR, then AND, recursively
//!   └────────────┘
//!        │ atomic text
//!        ▼
//!   ┌────────────┐
//!   │ condition  │  first matching shape → per-row mask
//!   └────────────┘
//!        │
//!        ▼   AND   ┌─────────┐
//!      Mask  ◄──── │ boolean │  include-true / include-blank toggles
//!                  └─────────┘
//! ```

pub mod boolean;
pub mod condition;
pub mod expression;
pub mod mask;

pub use boolean::{
    apply_bool_filters, default_bool_spec, detect_bool_columns, BoolColumnFilterSpec, BoolToggle,
    ToggleError,
};
pub use condition::{match_condition, parse_condition, CompareOp, Condition};
pub use expression::{
    check_parentheses, evaluate_expression, parse_expression, Expr, ExpressionError,
};
pub use mask::Mask;

use crate::data::model::HerdDataset;

// ---------------------------------------------------------------------------
// Filter state: expression text plus boolean toggles
// ---------------------------------------------------------------------------

/// Everything the user has entered to select rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    /// Filter expression; blank means no expression constraint.
    pub expression: String,
    /// Toggles for boolean-like columns.
    pub bool_filters: BoolColumnFilterSpec,
}

/// Initialise a [`FilterState`] with no expression and every boolean
/// state included (i.e., show everything).
pub fn init_filter_state(dataset: &HerdDataset) -> FilterState {
    FilterState {
        expression: String::new(),
        bool_filters: default_bool_spec(dataset),
    }
}

/// Mask of rows passing both the expression and the boolean toggles.
pub fn selection_mask(dataset: &HerdDataset, filters: &FilterState) -> Mask {
    let expression_mask = if filters.expression.trim().is_empty() {
        Mask::all(dataset.len())
    } else {
        evaluate_expression(dataset, &filters.expression)
    };
    if filters.bool_filters.is_empty() {
        return expression_mask;
    }
    expression_mask.and(&apply_bool_filters(dataset, &filters.bool_filters))
}

/// Return indices of records that pass all active filters, ascending.
pub fn filtered_indices(dataset: &HerdDataset, filters: &FilterState) -> Vec<usize> {
    selection_mask(dataset, filters).indices()
}

/// The records that pass all active filters, in their original order.
pub fn apply_filters(dataset: &HerdDataset, filters: &FilterState) -> HerdDataset {
    dataset.select(&selection_mask(dataset, filters))
}
