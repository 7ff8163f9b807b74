// Primitives for reading and writing CSV files.

use std::path::Path;

use crate::admin::io_common::{assemble_table, clean_cell, simplify_file_name};
use crate::admin::*;

/// Reads a CSV file with a header row. Lines may have different lengths.
pub fn read_csv_table(path: &str) -> BAdminResult<Table> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, line);
        rows.push(line.iter().map(clean_cell).collect());
    }
    // A byte order mark, as written by Excel.
    if let Some(Some(first)) = rows.first_mut().and_then(|r| r.first_mut()) {
        *first = first.trim_start_matches('\u{feff}').to_string();
    }
    info!(
        "Read {} lines from {}",
        rows.len(),
        simplify_file_name(path)
    );
    let table = assemble_table(rows).context(EmptyInputSnafu { path })?;
    Ok(table)
}

/// Writes a header and rows. Missing values are written as empty cells.
pub fn write_csv(path: &Path, header: &[&str], rows: &[Vec<Option<String>>]) -> BAdminResult<()> {
    let path_s = path.display().to_string();
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path: &path_s })?;
    wtr.write_record(header)
        .context(CsvWriteSnafu { path: &path_s })?;
    for row in rows.iter() {
        let cells: Vec<&str> = row
            .iter()
            .map(|c| c.as_deref().unwrap_or(""))
            .collect();
        wtr.write_record(&cells)
            .context(CsvWriteSnafu { path: &path_s })?;
    }
    wtr.flush()
        .map_err(csv::Error::from)
        .context(CsvWriteSnafu { path: &path_s })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_template() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("users.csv");
        fs::write(
            &p,
            "\u{feff}email,roleOID,siteGuid,siteName,siteCode\na@x.com,Monitor,,Karolinska,001\n,,,,\nb@x.com,Study Manager\n",
        )
        .unwrap();
        let table = read_csv_table(p.to_str().unwrap()).unwrap();
        assert_eq!(
            table.header,
            vec!["email", "roleOID", "siteGuid", "siteName", "siteCode"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row_number, 2);
        assert_eq!(table.rows[0].get(2), None);
        assert_eq!(table.rows[0].get(4), Some("001"));
        assert_eq!(table.rows[1].row_number, 4);
        assert_eq!(table.rows[1].get(3), None);
    }

    #[test]
    fn empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("empty.csv");
        fs::write(&p, "").unwrap();
        let res = read_csv_table(p.to_str().unwrap());
        assert!(matches!(res.map_err(|e| *e), Err(AdminError::EmptyInput { .. })));
    }

    #[test]
    fn writes_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out.csv");
        write_csv(
            &p,
            &["a", "b"],
            &[vec![Some("1".to_string()), None], vec![None, Some("x,y".to_string())]],
        )
        .unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "a,b\n1,\n,\"x,y\"\n");
    }
}
