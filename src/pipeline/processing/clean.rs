use metrics::counter;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_Z_THRESHOLD, POWER_OUTPUT_COLUMN};
use crate::error::CleaningError;
use crate::pipeline::processing::stats::{mean, Spread};
use crate::types::{format_value, CleanedDataset, CleanedRecord, Dataset};

/// Configuration for the global cleaning pass
#[derive(Debug, Clone)]
pub struct CleaningConfig {
    /// Numeric column that is coerced, imputed and filtered
    pub target_column: String,
    /// Rows with |z| above this are dropped
    pub z_threshold: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            target_column: POWER_OUTPUT_COLUMN.to_string(),
            z_threshold: DEFAULT_Z_THRESHOLD,
        }
    }
}

/// Result of a cleaning pass, with the counts reported at the end of a run
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub data: CleanedDataset,
    /// Missing or non-numeric cells replaced by the column mean
    pub imputed: usize,
    /// Rows outside the global band
    pub dropped: usize,
    /// Location and spread of the imputed column; `None` when it held no numbers
    pub spread: Option<Spread>,
}

/// Coerces, imputes and filters the target column over the whole dataset.
pub struct Cleaner {
    pub config: CleaningConfig,
}

impl Cleaner {
    pub fn new() -> Self {
        Self {
            config: CleaningConfig::default(),
        }
    }

    pub fn with_config(config: CleaningConfig) -> Self {
        Self { config }
    }

    pub fn clean(&self, dataset: &Dataset) -> Result<CleaningOutcome, CleaningError> {
        let target = dataset
            .column_index(&self.config.target_column)
            .ok_or_else(|| CleaningError::MissingColumn(self.config.target_column.clone()))?;

        let parsed: Vec<Option<f64>> = dataset
            .rows
            .iter()
            .map(|row| coerce_numeric(&row[target]))
            .collect();

        let present: Vec<f64> = parsed.iter().flatten().copied().collect();
        let Some(fill) = mean(&present) else {
            warn!(
                "Column '{}' has no numeric values; all {} rows dropped",
                self.config.target_column,
                dataset.len()
            );
            counter!("turbine_rows_dropped_total").increment(dataset.len() as u64);
            return Ok(CleaningOutcome {
                data: CleanedDataset {
                    columns: dataset.columns.clone(),
                    records: Vec::new(),
                },
                imputed: 0,
                dropped: dataset.len(),
                spread: None,
            });
        };

        let imputed = parsed.len() - present.len();
        let values: Vec<f64> = parsed.iter().map(|v| v.unwrap_or(fill)).collect();

        let spread = Spread::of(&values).unwrap_or(Spread {
            mean: fill,
            std_dev: 0.0,
        });
        debug!(
            "Global mean {:.4}, std dev {:.4} over {} values ({} imputed)",
            spread.mean,
            spread.std_dev,
            values.len(),
            imputed
        );

        let records: Vec<CleanedRecord> = dataset
            .rows
            .iter()
            .zip(&values)
            .filter(|(_, value)| spread.z_score(**value).abs() <= self.config.z_threshold)
            .map(|(row, value)| {
                let mut cells = row.clone();
                cells[target] = format_value(*value);
                CleanedRecord {
                    cells,
                    power_output: *value,
                }
            })
            .collect();

        let dropped = dataset.len() - records.len();
        counter!("turbine_values_imputed_total").increment(imputed as u64);
        counter!("turbine_rows_dropped_total").increment(dropped as u64);
        info!(
            "Data cleaning completed: {} rows kept, {} dropped, {} values imputed",
            records.len(),
            dropped,
            imputed
        );

        Ok(CleaningOutcome {
            data: CleanedDataset {
                columns: dataset.columns.clone(),
                records,
            },
            imputed,
            dropped,
            spread: Some(spread),
        })
    }
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a cell as a finite number; anything else is missing.
pub fn coerce_numeric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: &[(&str, &str)]) -> Dataset {
        Dataset {
            columns: vec![
                "turbine_id".to_string(),
                "power_output".to_string(),
                "source_file".to_string(),
            ],
            rows: rows
                .iter()
                .map(|(id, power)| vec![id.to_string(), power.to_string(), "a.csv".to_string()])
                .collect(),
        }
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric("100"), Some(100.0));
        assert_eq!(coerce_numeric(" 12.5 "), Some(12.5));
        assert_eq!(coerce_numeric("1e3"), Some(1000.0));
        assert_eq!(coerce_numeric(""), None);
        assert_eq!(coerce_numeric("n/a"), None);
        assert_eq!(coerce_numeric("NaN"), None);
        assert_eq!(coerce_numeric("inf"), None);
    }

    #[test]
    fn test_missing_target_column() {
        let data = Dataset {
            columns: vec!["turbine_id".to_string()],
            rows: vec![vec!["T1".to_string()]],
        };
        let err = Cleaner::new().clean(&data).unwrap_err();
        assert!(matches!(err, CleaningError::MissingColumn(c) if c == "power_output"));
    }

    #[test]
    fn test_missing_values_are_imputed_with_mean() {
        let data = dataset(&[("T1", "100"), ("T1", ""), ("T2", "oops"), ("T2", "200")]);
        let outcome = Cleaner::new().clean(&data).unwrap();

        assert_eq!(outcome.imputed, 2);
        assert_eq!(outcome.dropped, 0);
        let values: Vec<f64> = outcome.data.values().collect();
        assert_eq!(values, vec![100.0, 150.0, 150.0, 200.0]);
        assert_eq!(outcome.data.records[1].cells[1], "150.0");
        assert_eq!(outcome.data.records[3].cells[1], "200.0");
    }

    #[test]
    fn test_global_outlier_is_dropped() {
        let mut rows: Vec<(&str, &str)> = vec![
            ("T1", "100"),
            ("T1", "110"),
            ("T1", "120"),
            ("T1", "130"),
            ("T1", "140"),
            ("T1", "9999"),
        ];
        rows.extend([("T2", "150"), ("T2", "160"), ("T2", "170"), ("T2", "180"), ("T2", "190"), ("T2", "200")]);
        let outcome = Cleaner::new().clean(&dataset(&rows)).unwrap();

        assert_eq!(outcome.dropped, 1);
        assert!(outcome.data.values().all(|v| v < 9999.0));
        // Survivors keep their original order and attributes.
        assert_eq!(outcome.data.records[0].cells, vec!["T1", "100.0", "a.csv"]);
        assert_eq!(outcome.data.records[5].cells[0], "T2");
    }

    #[test]
    fn test_five_points_cannot_exceed_two_sample_deviations() {
        let data = dataset(&[("T1", "100"), ("T1", "200"), ("T1", "9999"), ("T2", "150"), ("T2", "160")]);
        let outcome = Cleaner::new().clean(&data).unwrap();

        let spread = outcome.spread.unwrap();
        assert!((spread.mean - 2121.8).abs() < 1e-9);
        assert!(spread.z_score(9999.0) < 2.0);
        assert_eq!(outcome.data.len(), 5);
    }

    #[test]
    fn test_constant_column_keeps_every_row() {
        let data = dataset(&[("T1", "50"), ("T1", "50"), ("T2", "50")]);
        let outcome = Cleaner::new().clean(&data).unwrap();
        assert_eq!(outcome.data.len(), 3);
        assert_eq!(outcome.spread.unwrap().std_dev, 0.0);
    }

    #[test]
    fn test_cleaning_is_idempotent_on_constant_output() {
        let data = dataset(&[("T1", "50"), ("T2", ""), ("T2", "50")]);
        let cleaner = Cleaner::new();
        let first = cleaner.clean(&data).unwrap();

        let as_raw = Dataset {
            columns: first.data.columns.clone(),
            rows: first.data.records.iter().map(|r| r.cells.clone()).collect(),
        };
        let second = cleaner.clean(&as_raw).unwrap();
        assert_eq!(first.data, second.data);
        assert_eq!(second.dropped, 0);
        assert_eq!(second.imputed, 0);
    }

    #[test]
    fn test_single_row_is_retained() {
        let data = dataset(&[("T1", "75")]);
        let outcome = Cleaner::new().clean(&data).unwrap();
        assert_eq!(outcome.data.len(), 1);
    }

    #[test]
    fn test_no_numeric_values_yields_empty_dataset() {
        let data = dataset(&[("T1", ""), ("T2", "offline")]);
        let outcome = Cleaner::new().clean(&data).unwrap();
        assert!(outcome.data.is_empty());
        assert_eq!(outcome.dropped, 2);
        assert!(outcome.spread.is_none());
        assert_eq!(outcome.data.columns.len(), 3);
    }

    #[test]
    fn test_custom_threshold() {
        let data = dataset(&[("T1", "0"), ("T1", "10"), ("T1", "20"), ("T1", "30"), ("T1", "100")]);
        let strict = Cleaner::with_config(CleaningConfig {
            z_threshold: 1.0,
            ..CleaningConfig::default()
        });
        let outcome = strict.clean(&data).unwrap();
        assert_eq!(outcome.dropped, 1);
        assert!(outcome.data.values().all(|v| v <= 30.0));
    }
}
