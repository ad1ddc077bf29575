//! Writing the filtered result set to disk

use crate::core::dataset::Row;
use crate::error::{FilterDeckError, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Timestamped file name inside `dir` for a new export
pub fn export_path(dir: &Path, format: ExportFormat) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    dir.join(format!("filterdeck-{stamp}.{}", format.extension()))
}

/// Write `rows` as CSV with one column per entry of `columns`
///
/// Missing and null values are written as empty cells.
pub fn export_csv(path: &Path, columns: &[String], rows: &[Row]) -> Result<usize> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| row.text(c)))?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "exported csv");
    Ok(rows.len())
}

/// Write `rows` as a pretty-printed JSON array of their original records
pub fn export_json(path: &Path, rows: &[Row]) -> Result<usize> {
    ensure_parent(path)?;
    let records: Vec<&Map<String, Value>> = rows.iter().map(|r| &r.values).collect();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &records)
        .map_err(|e| FilterDeckError::Export(e.to_string()))?;
    info!(path = %path.display(), rows = rows.len(), "exported json");
    Ok(rows.len())
}

/// Export in `format` to a fresh file under `dir`, returning the path written
pub fn export_to_dir(
    dir: &Path,
    format: ExportFormat,
    columns: &[String],
    rows: &[Row],
) -> Result<PathBuf> {
    let path = export_path(dir, format);
    match format {
        ExportFormat::Csv => export_csv(&path, columns, rows)?,
        ExportFormat::Json => export_json(&path, rows)?,
    };
    Ok(path)
}

/// A single row as pretty JSON, for the clipboard
pub fn row_to_json(row: &Row) -> Result<String> {
    serde_json::to_string_pretty(&row.values).map_err(|e| FilterDeckError::Export(e.to_string()))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
