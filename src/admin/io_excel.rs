// Reading the import templates from Excel and OpenDocument workbooks.

use calamine::{open_workbook_auto, DataType, Reader};

use crate::admin::io_common::{assemble_table, clean_cell, format_number, simplify_file_name};
use crate::admin::*;

/// Reads the first worksheet, or the one named.
pub fn read_excel_table(path: &str, worksheet: &Option<String>) -> BAdminResult<Table> {
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyInputSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    debug!(
        "read_excel_table: {}: {} rows",
        simplify_file_name(path),
        wrange.height()
    );

    let rows: Vec<Vec<Option<String>>> = wrange
        .rows()
        .map(|row| row.iter().map(read_cell).collect())
        .collect();
    let table = assemble_table(rows).context(EmptyInputSnafu { path })?;
    Ok(table)
}

/// Everything is read as text. Booleans follow the spelling of the API.
pub fn read_cell(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => clean_cell(s),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) => Some(format_number(*f)),
        DataType::Bool(true) => Some("True".to_string()),
        DataType::Bool(false) => Some("False".to_string()),
        DataType::Empty => None,
        DataType::Error(e) => {
            warn!("Unreadable cell in the input file: {:?}", e);
            None
        }
        // Dates are not expected in the templates.
        DataType::DateTime(f) => Some(format_number(*f)),
        #[allow(unreachable_patterns)]
        other => {
            warn!("Unexpected cell in the input file: {:?}", other);
            None
        }
    }
}
