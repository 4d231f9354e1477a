//! Groups cleaned rows by turbine for the summary and anomaly stages.

use std::collections::BTreeMap;

use crate::error::AggregationError;
use crate::types::CleanedDataset;

/// Row indices per turbine id, ids in ascending order, indices in row order.
pub type Groups<'a> = BTreeMap<&'a str, Vec<usize>>;

/// Groups rows by exact id. Rows with an empty id belong to no group.
pub fn group_by_id<'a>(
    data: &'a CleanedDataset,
    id_column: &str,
) -> Result<Groups<'a>, AggregationError> {
    let id_index = data
        .column_index(id_column)
        .ok_or_else(|| AggregationError::MissingColumn(id_column.to_string()))?;

    let mut groups: Groups<'a> = BTreeMap::new();
    for (row, record) in data.records.iter().enumerate() {
        let id = record.cells[id_index].as_str();
        if id.is_empty() {
            continue;
        }
        groups.entry(id).or_default().push(row);
    }
    Ok(groups)
}
