//! CSV persistence for dataset rows.
//!
//! Layout: one column per field label followed by the reserved
//! `Scenario Type` and `Used` columns. Field values are written wrapped in
//! single quotes so spreadsheet tools keep them as text; reading removes
//! exactly that one layer.

use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{DataRow, ScenarioType};
use crate::error::{DatasetError, DatasetResult};

pub const SCENARIO_COLUMN: &str = "Scenario Type";
pub const USED_COLUMN: &str = "Used";

const VALUE_QUOTE: char = '\'';

/// Rows plus the column order they were stored in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowTable {
    pub labels: Vec<String>,
    pub rows: Vec<DataRow>,
}

pub fn is_reserved_column(label: &str) -> bool {
    label == SCENARIO_COLUMN || label == USED_COLUMN
}

pub fn read_rows(path: &Path) -> DatasetResult<RowTable> {
    let bytes = fs::read(path).map_err(|e| DatasetError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes.as_slice());

    let headers = reader.headers()?.clone();
    let scenario_idx = headers
        .iter()
        .position(|h| h == SCENARIO_COLUMN)
        .ok_or_else(|| DatasetError::Format(format!("missing '{}' column", SCENARIO_COLUMN)))?;
    let used_idx = headers.iter().position(|h| h == USED_COLUMN);

    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !is_reserved_column(h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let scenario_cell = record.get(scenario_idx).unwrap_or_default();
        let scenario: ScenarioType = unwrap_value(scenario_cell)
            .parse()
            .map_err(|e| DatasetError::Format(format!("row {}: {}", line, e)))?;

        let mut row = DataRow::new(scenario);
        row.used = used_idx
            .and_then(|i| record.get(i))
            .map(parse_used)
            .unwrap_or(false);
        for (i, label) in &columns {
            row.push(label.clone(), unwrap_value(record.get(*i).unwrap_or_default()));
        }
        rows.push(row);
    }

    Ok(RowTable {
        labels: columns.into_iter().map(|(_, label)| label).collect(),
        rows,
    })
}

pub fn write_rows(path: &Path, labels: &[String], rows: &[DataRow]) -> DatasetResult<()> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<&str> = labels.iter().map(String::as_str).collect();
    header.push(SCENARIO_COLUMN);
    header.push(USED_COLUMN);
    writer.write_record(&header)?;

    for row in rows {
        let mut record: Vec<String> = labels
            .iter()
            .map(|label| wrap_value(row.get(label).unwrap_or_default()))
            .collect();
        record.push(row.scenario.to_string());
        record.push(if row.used { "TRUE" } else { "FALSE" }.to_string());
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DatasetError::io(path, e.into_error()))?;
    write_atomic(path, &bytes)
}

/// Write to a sibling temporary file and rename it over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> DatasetResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
        }
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, bytes).map_err(|e| DatasetError::io(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        DatasetError::io(path, e)
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn wrap_value(value: &str) -> String {
    format!("{q}{v}{q}", q = VALUE_QUOTE, v = value)
}

fn unwrap_value(cell: &str) -> &str {
    if cell.len() >= 2 && cell.starts_with(VALUE_QUOTE) && cell.ends_with(VALUE_QUOTE) {
        &cell[1..cell.len() - 1]
    } else {
        cell
    }
}

fn parse_used(cell: &str) -> bool {
    matches!(
        unwrap_value(cell).trim().to_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_rows() -> (Vec<String>, Vec<DataRow>) {
        let labels = vec!["Name".to_string(), "Notes".to_string()];
        let mut first = DataRow::new(ScenarioType::Positive);
        first.push("Name", "Ada, Countess");
        first.push("Notes", "'quoted'");
        let mut second = DataRow::new(ScenarioType::Negative);
        second.push("Name", "");
        second.push("Notes", "line");
        second.used = true;
        (labels, vec![first, second])
    }

    #[test]
    fn test_write_then_read_preserves_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.csv");
        let (labels, rows) = sample_rows();

        write_rows(&path, &labels, &rows).unwrap();
        let table = read_rows(&path).unwrap();

        assert_eq!(table.labels, labels);
        assert_eq!(table.rows, rows);
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_header_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/rows.csv");
        let (labels, rows) = sample_rows();

        write_rows(&path, &labels, &rows).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header, "Name,Notes,Scenario Type,Used");
        assert!(content.contains("'Ada, Countess'"));
    }

    #[test]
    fn test_reads_unwrapped_legacy_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.csv");
        fs::write(&path, "Name,Scenario Type,Used\nPlain,Positive,yes\n").unwrap();

        let table = read_rows(&path).unwrap();
        assert_eq!(table.rows[0].get("Name"), Some("Plain"));
        assert!(table.rows[0].used);
    }

    #[test]
    fn test_missing_scenario_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.csv");
        fs::write(&path, "Name,Used\nx,FALSE\n").unwrap();

        assert!(matches!(read_rows(&path), Err(DatasetError::Format(_))));
    }
}
