use std::path::Path;

use viedoc_provisioning::{Table, TableRow};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// A cell value as typed by the user. Whitespace around it is not significant.
pub fn clean_cell(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Spreadsheets store whole numbers as floats: `12.0` is read back as `12`.
pub fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Builds a table from raw rows, the first one being the header.
///
/// Blank rows are dropped. The others keep their position in the file: the first
/// data row is row 2.
pub fn assemble_table(mut rows: Vec<Vec<Option<String>>>) -> Option<Table> {
    if rows.is_empty() {
        return None;
    }
    let header: Vec<String> = rows
        .remove(0)
        .into_iter()
        .map(|c| c.unwrap_or_default())
        .collect();
    let rows: Vec<TableRow> = rows
        .into_iter()
        .enumerate()
        .filter(|(_, cells)| cells.iter().any(|c| c.is_some()))
        .map(|(idx, cells)| TableRow {
            row_number: idx + 2,
            cells,
        })
        .collect();
    Some(Table { header, rows })
}
