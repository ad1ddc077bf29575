use crate::core::validation::validate_condition;
use crate::core::{
    count_matches, evaluate, Condition, ConditionId, ConditionTree, Dataset,
    GroupedView, Operator, Row,
};
use crate::error::{FilterDeckError, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// DataService holds the session state of one filtering session
///
/// This service is responsible for:
/// - Turning fetch results into a dataset and seeding the condition tree
/// - Validating condition edits before they reach the tree
/// - Caching the filtered rows until the dataset or tree changes
#[derive(Debug, Default)]
pub struct DataService {
    dataset: Option<Dataset>,
    tree: ConditionTree,
    loading: bool,
    last_error: Option<String>,
    /// Dataset generation, bumped whenever the dataset is replaced or cleared
    data_revision: u64,
    cache: Option<FilterCache>,
}

#[derive(Debug)]
struct FilterCache {
    data_revision: u64,
    tree_revision: u64,
    rows: Arc<Vec<Row>>,
}

impl DataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a request as in flight
    pub fn begin_loading(&mut self) {
        self.loading = true;
        self.last_error = None;
    }

    /// The in-flight request was abandoned; the dataset stays as it is
    pub fn cancel_loading(&mut self) {
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record an error raised outside the data path (e.g. an invalid URL)
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Apply the outcome of a fetch
    ///
    /// Success replaces the dataset and seeds the tree with one inert condition
    /// over the first column. Failure clears columns, rows and conditions.
    pub fn apply_fetch_result(&mut self, outcome: Result<Value>) -> Result<()> {
        self.apply_fetch_result_from(None, outcome)
    }

    /// Like `apply_fetch_result`, remembering the URL the data came from
    pub fn apply_fetch_result_from(
        &mut self,
        source: Option<&str>,
        outcome: Result<Value>,
    ) -> Result<()> {
        self.loading = false;
        match outcome.and_then(Dataset::infer) {
            Ok(dataset) => {
                let dataset = match source {
                    Some(url) => dataset.with_source(url),
                    None => dataset,
                };
                info!(
                    rows = dataset.row_count(),
                    columns = dataset.column_count(),
                    "loaded dataset"
                );
                self.tree.seed(dataset.columns.as_slice());
                self.dataset = Some(dataset);
                self.data_revision += 1;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("clearing data after failed load: {e}");
                self.reset();
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the dataset and every condition
    pub fn clear(&mut self) {
        self.loading = false;
        self.last_error = None;
        self.reset();
    }

    fn reset(&mut self) {
        self.dataset = None;
        self.tree.clear();
        self.data_revision += 1;
        self.cache = None;
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Columns of the loaded dataset, empty when nothing is loaded
    pub fn columns(&self) -> &[String] {
        self.dataset
            .as_ref()
            .map(|d| d.columns.as_slice())
            .unwrap_or_default()
    }

    pub fn tree(&self) -> &ConditionTree {
        &self.tree
    }

    pub fn grouped_view(&self) -> GroupedView {
        self.tree.grouped_view()
    }

    pub fn condition(&self, id: &ConditionId) -> Option<&Condition> {
        self.tree.find(id)
    }

    /// Append a new AND group over the first column
    pub fn add_and_group(&mut self) -> Option<ConditionId> {
        let field = self.default_field()?;
        Some(self.tree.add_and_group(&field))
    }

    /// Add an OR sibling after `anchor` over the first column
    pub fn add_or_sibling(&mut self, anchor: &ConditionId) -> Option<ConditionId> {
        let field = self.default_field()?;
        self.tree.find(anchor)?;
        Some(self.tree.add_or_sibling(anchor, &field))
    }

    pub fn delete_condition(&mut self, id: &ConditionId) -> bool {
        self.tree.delete(id)
    }

    pub fn can_delete(&self) -> bool {
        self.tree.can_delete()
    }

    /// Point a condition at another column
    pub fn set_field(&mut self, id: &ConditionId, field: &str) -> Result<()> {
        let known = self
            .dataset
            .as_ref()
            .is_some_and(|d| d.columns.contains_column(field));
        if !known {
            return Err(FilterDeckError::invalid_input(
                "field",
                format!("Unknown column: {field}"),
            ));
        }
        self.edit(id, |c| c.field = field.to_string())
    }

    /// Change a condition's operator
    ///
    /// Always committed. A stored value that is invalid for the new operator
    /// is kept; `value_problem` reports it.
    pub fn set_operator(&mut self, id: &ConditionId, operator: Operator) -> Result<()> {
        self.edit(id, |c| c.operator = operator)
    }

    /// Validation message for the stored value under its current operator
    pub fn value_problem(&self, id: &ConditionId) -> Option<String> {
        match validate_condition(self.tree.find(id)?) {
            Ok(()) => None,
            Err(e) => Some(e.to_string()),
        }
    }

    /// Change a condition's value after validating it for its operator
    ///
    /// A rejected value leaves the stored value untouched.
    pub fn set_value(&mut self, id: &ConditionId, value: &str) -> Result<()> {
        let candidate = self
            .tree
            .find(id)
            .cloned()
            .ok_or_else(|| unknown_condition(id))?
            .with_value(value);
        validate_condition(&candidate)?;
        self.edit(id, |c| c.value = value.to_string())
    }

    fn edit<F>(&mut self, id: &ConditionId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Condition),
    {
        if self.tree.update_with(id, edit) {
            Ok(())
        } else {
            Err(unknown_condition(id))
        }
    }

    fn default_field(&self) -> Option<String> {
        self.dataset
            .as_ref()
            .and_then(|d| d.columns.first())
            .map(str::to_string)
    }

    /// Rows passing the current tree, recomputed only after a change
    pub fn filtered_rows(&mut self) -> Arc<Vec<Row>> {
        let tree_revision = self.tree.revision();
        if let Some(cache) = &self.cache {
            if cache.data_revision == self.data_revision && cache.tree_revision == tree_revision {
                return Arc::clone(&cache.rows);
            }
        }

        let rows = match &self.dataset {
            Some(dataset) => evaluate(&dataset.rows, &self.tree.grouped_view()),
            None => Vec::new(),
        };
        debug!(filtered = rows.len(), tree_revision, "re-evaluated filter");
        let rows = Arc::new(rows);
        self.cache = Some(FilterCache {
            data_revision: self.data_revision,
            tree_revision,
            rows: Arc::clone(&rows),
        });
        rows
    }

    pub fn total_count(&self) -> usize {
        self.dataset.as_ref().map(Dataset::row_count).unwrap_or(0)
    }

    pub fn filtered_count(&self) -> usize {
        match &self.cache {
            Some(cache)
                if cache.data_revision == self.data_revision
                    && cache.tree_revision == self.tree.revision() =>
            {
                cache.rows.len()
            }
            _ => self
                .dataset
                .as_ref()
                .map(|d| count_matches(&d.rows, &self.tree.grouped_view()))
                .unwrap_or(0),
        }
    }
}

fn unknown_condition(id: &ConditionId) -> FilterDeckError {
    FilterDeckError::invalid_input("condition", format!("Unknown condition: {id}"))
}
