// Pipeline ingestion: input discovery and concatenation of per-file tables

pub mod reader;

use metrics::counter;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::constants::{INPUT_EXTENSION, SOURCE_FILE_COLUMN};
use crate::error::IngestError;
use crate::types::Dataset;

pub use reader::{read_table, FileTable};

/// Lists the `.csv` files directly inside `dir`, sorted by file name.
pub fn discover_input_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .map(|ext| ext == INPUT_EXTENSION)
            .unwrap_or(false);
        if is_csv && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(IngestError::NoInputFiles(dir.to_path_buf()));
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Reads every input file and concatenates them into one dataset.
///
/// Columns are the union of all headers in first-seen order followed by
/// `source_file`. Cells for columns a file does not define are left empty.
#[instrument(skip_all, fields(input_dir = %dir.display()))]
pub fn load_dataset(dir: &Path) -> Result<Dataset, IngestError> {
    let files = discover_input_files(dir)?;

    // Every file must parse before anything is concatenated.
    let mut tables = Vec::with_capacity(files.len());
    for path in &files {
        let table = read_table(path)?;
        debug!(
            "Read {} rows ({} columns) from {}",
            table.rows.len(),
            table.columns.len(),
            table.source_file
        );
        tables.push(table);
    }

    let dataset = concat_tables(&tables);
    counter!("turbine_rows_ingested_total").increment(dataset.len() as u64);
    info!(
        "Data ingestion completed: {} rows from {} files",
        dataset.len(),
        tables.len()
    );
    Ok(dataset)
}

/// Aligns tables on a shared column set and appends the `source_file` column.
pub fn concat_tables(tables: &[FileTable]) -> Dataset {
    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for table in tables {
        for column in &table.columns {
            // The loader owns `source_file`; an input column of that name is overwritten.
            if column == SOURCE_FILE_COLUMN || positions.contains_key(column.as_str()) {
                continue;
            }
            positions.insert(column.as_str(), columns.len());
            columns.push(column.clone());
        }
    }
    let source_index = columns.len();
    let width = source_index + 1;

    let total: usize = tables.iter().map(|t| t.rows.len()).sum();
    let mut rows = Vec::with_capacity(total);

    for table in tables {
        let targets: Vec<Option<usize>> = table
            .columns
            .iter()
            .map(|c| {
                if c == SOURCE_FILE_COLUMN {
                    None
                } else {
                    positions.get(c.as_str()).copied()
                }
            })
            .collect();

        for row in &table.rows {
            let mut cells = vec![String::new(); width];
            for (cell, target) in row.iter().zip(&targets) {
                if let Some(index) = target {
                    cells[*index] = cell.clone();
                }
            }
            cells[source_index] = table.source_file.clone();
            rows.push(cells);
        }
    }

    columns.push(SOURCE_FILE_COLUMN.to_string());
    Dataset { columns, rows }
}
