use crate::data::model::HerdDataset;
use crate::filter::{filtered_indices, init_filter_state, BoolToggle, FilterState, ToggleError};

// ---------------------------------------------------------------------------
// Filter session
// ---------------------------------------------------------------------------

/// A loaded dataset together with the user's filter inputs and the rows
/// they currently select. Edits only take effect on [`FilterSession::apply`].
pub struct FilterSession {
    /// The dataset as loaded; never modified by filtering.
    pub dataset: HerdDataset,

    /// Current expression text and boolean toggles.
    pub filters: FilterState,

    /// Indices of records passing the last applied filters (cached).
    pub visible_indices: Vec<usize>,
}

impl FilterSession {
    /// Start a session with no expression, every toggle on and every
    /// record visible.
    pub fn new(dataset: HerdDataset) -> Self {
        Self {
            filters: init_filter_state(&dataset),
            visible_indices: (0..dataset.len()).collect(),
            dataset,
        }
    }

    pub fn set_expression(&mut self, expression: impl Into<String>) {
        self.filters.expression = expression.into();
    }

    /// Toggle whether `true` cells of a boolean column are shown.
    pub fn set_include_true(&mut self, column: &str, include: bool) -> Result<(), ToggleError> {
        self.toggle_mut(column)?.include_true = include;
        Ok(())
    }

    /// Toggle whether missing or empty cells of a boolean column are shown.
    pub fn set_include_blank(&mut self, column: &str, include: bool) -> Result<(), ToggleError> {
        self.toggle_mut(column)?.include_blank = include;
        Ok(())
    }

    fn toggle_mut(&mut self, column: &str) -> Result<&mut BoolToggle, ToggleError> {
        self.filters
            .bool_filters
            .get_mut(column)
            .ok_or_else(|| ToggleError::NotBooleanColumn(column.to_string()))
    }

    /// Recompute `visible_indices` from the current filters.
    pub fn apply(&mut self) {
        self.visible_indices = filtered_indices(&self.dataset, &self.filters);
        log::debug!(
            "filter '{}' selects {} of {} records",
            self.filters.expression,
            self.visible_indices.len(),
            self.dataset.len()
        );
    }

    /// Clear the expression, restore every toggle and show every record.
    pub fn reset(&mut self) {
        self.filters = init_filter_state(&self.dataset);
        self.visible_indices = (0..self.dataset.len()).collect();
    }

    /// The currently visible records, in their original order.
    pub fn selected_dataset(&self) -> HerdDataset {
        self.dataset.select_indices(&self.visible_indices)
    }
}
