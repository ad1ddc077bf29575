//! Column and row inference over a decoded JSON array

use crate::error::{FilterDeckError, Result};
use chrono::{DateTime, Utc};
use derive_deref::Deref;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Ordered set of distinct, word-character column names
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize)]
pub struct ColumnSet(Vec<String>);

impl ColumnSet {
    /// Collect keys from `records` in first-seen order, skipping keys that
    /// contain non-word characters
    pub fn infer<'a>(records: impl IntoIterator<Item = &'a Map<String, Value>>) -> Self {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for record in records {
            for key in record.keys() {
                if is_word_key(key) && seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
        Self(columns)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Column list with `id` moved to the front, as the grid shows it
    pub fn display_order(&self) -> Vec<String> {
        let mut ordered: Vec<String> = self.0.iter().filter(|c| *c == "id").cloned().collect();
        ordered.extend(self.0.iter().filter(|c| *c != "id").cloned());
        ordered
    }
}

impl From<Vec<String>> for ColumnSet {
    fn from(columns: Vec<String>) -> Self {
        Self(columns)
    }
}

fn is_word_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One fetched record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// The record's own `id` when it has one, otherwise a generated uuid
    pub id: String,
    pub values: Map<String, Value>,
}

impl Row {
    pub fn new(values: Map<String, Value>) -> Self {
        let id = values
            .get("id")
            .map(value_to_text)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self { id, values }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Field value rendered as text; missing and null fields are empty
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(value_to_text).unwrap_or_default()
    }
}

/// Render a JSON scalar the way it is compared and displayed
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_text(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Whole floats drop their fraction (`30.0` reads as `30`); magnitudes at or
/// above 1e21 or below 1e-6 use exponent notation
fn number_to_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    let Some(f) = n.as_f64() else {
        return n.to_string();
    };
    if f == 0.0 {
        return "0".to_string();
    }
    let magnitude = f.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let text = format!("{f:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }
    if f.fract() == 0.0 {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}

/// Columns and rows produced by one successful fetch
#[derive(Debug, Clone)]
pub struct Dataset {
    pub columns: ColumnSet,
    pub rows: Arc<Vec<Row>>,
    pub source: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Infer columns and rows from a decoded response body
    ///
    /// The body must be a JSON array; elements that are not objects are skipped.
    pub fn infer(body: Value) -> Result<Self> {
        let Value::Array(items) = body else {
            return Err(FilterDeckError::ParseFailed(
                "expected a JSON array of key/value records".to_string(),
            ));
        };

        let total = items.len();
        let records: Vec<Map<String, Value>> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        if records.len() != total {
            warn!(skipped = total - records.len(), "skipped non-object array elements");
        }

        let columns = ColumnSet::infer(records.iter());
        let rows = records.into_iter().map(Row::new).collect();

        Ok(Self {
            columns,
            rows: Arc::new(rows),
            source: None,
            loaded_at: Utc::now(),
        })
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
