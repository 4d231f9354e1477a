use tracing::info;

use crate::constants::TURBINE_ID_COLUMN;
use crate::error::AggregationError;
use crate::pipeline::processing::grouping::group_by_id;
use crate::types::{CleanedDataset, SummaryRow};

/// Computes min, max and mean power per turbine, ordered by turbine id.
pub fn summarize(data: &CleanedDataset) -> Result<Vec<SummaryRow>, AggregationError> {
    summarize_by(data, TURBINE_ID_COLUMN)
}

pub fn summarize_by(
    data: &CleanedDataset,
    id_column: &str,
) -> Result<Vec<SummaryRow>, AggregationError> {
    let groups = group_by_id(data, id_column)?;

    let summary: Vec<SummaryRow> = groups
        .into_iter()
        .map(|(id, rows)| {
            let mut min_power = f64::INFINITY;
            let mut max_power = f64::NEG_INFINITY;
            let mut sum = 0.0;
            for &row in &rows {
                let value = data.records[row].power_output;
                min_power = min_power.min(value);
                max_power = max_power.max(value);
                sum += value;
            }
            SummaryRow {
                turbine_id: id.to_string(),
                min_power,
                max_power,
                avg_power: sum / rows.len() as f64,
            }
        })
        .collect();

    info!("Summary statistics calculated for {} turbines", summary.len());
    Ok(summary)
}
