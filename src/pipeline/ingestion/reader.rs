use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::IngestError;

/// One parsed input file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTable {
    /// Base name of the file the rows came from.
    pub source_file: String,
    pub columns: Vec<String>,
    /// Cells aligned with `columns`; short rows are padded with empty cells.
    pub rows: Vec<Vec<String>>,
}

/// Parses a header-first delimited file.
///
/// The file handle lives only for the duration of this call.
pub fn read_table(path: &Path) -> Result<FileTable, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let csv_err = |source: csv::Error| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(IngestError::EmptyHeader(path.to_path_buf()));
    }

    let mut seen = HashSet::new();
    for column in &columns {
        if !seen.insert(column.as_str()) {
            return Err(IngestError::DuplicateColumn {
                path: path.to_path_buf(),
                column: column.clone(),
            });
        }
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        if record.len() > columns.len() {
            return Err(IngestError::TooManyFields {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: columns.len(),
                found: record.len(),
            });
        }

        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        cells.resize(columns.len(), String::new());
        rows.push(cells);
    }

    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(FileTable {
        source_file,
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_reads_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("site_a.csv");
        fs::write(&path, " turbine_id , power_output\nT1,100\nT1,\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.source_file, "site_a.csv");
        assert_eq!(table.columns, vec!["turbine_id", "power_output"]);
        assert_eq!(table.rows, vec![vec!["T1", "100"], vec!["T1", ""]]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(&path, "turbine_id,power_output,status\nT1,100\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.rows[0], vec!["T1", "100", ""]);
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.csv");
        fs::write(&path, "turbine_id,power_output\nT1,100,extra\n").unwrap();

        let err = read_table(&path).unwrap_err();
        match err {
            IngestError::TooManyFields { line, expected, found, .. } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_header_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.csv");
        fs::write(&path, "turbine_id,turbine_id\nT1,T2\n").unwrap();

        assert!(matches!(
            read_table(&path).unwrap_err(),
            IngestError::DuplicateColumn { .. }
        ));
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        fs::write(&path, b"turbine_id,power_output\nT\xe9,100\n").unwrap();

        assert!(matches!(read_table(&path).unwrap_err(), IngestError::Csv { .. }));
    }

    #[test]
    fn test_empty_file_has_no_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();

        assert!(matches!(read_table(&path).unwrap_err(), IngestError::EmptyHeader(_)));
    }
}
