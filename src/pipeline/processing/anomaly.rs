use metrics::counter;
use tracing::{debug, info};

use crate::constants::{DEFAULT_Z_THRESHOLD, TURBINE_ID_COLUMN};
use crate::error::AggregationError;
use crate::pipeline::processing::grouping::group_by_id;
use crate::pipeline::processing::stats::Spread;
use crate::types::CleanedDataset;

/// Configuration for per-turbine anomaly flagging
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    pub id_column: String,
    /// Rows deviating more than this many group standard deviations are flagged
    pub z_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            id_column: TURBINE_ID_COLUMN.to_string(),
            z_threshold: DEFAULT_Z_THRESHOLD,
        }
    }
}

/// Flags cleaned rows that sit far from their own turbine's mean.
///
/// The band is local to each turbine, unlike the dataset-wide band used
/// during cleaning.
pub struct AnomalyDetector {
    pub config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self {
            config: AnomalyConfig::default(),
        }
    }

    pub fn with_config(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Returns the flagged rows with all their attributes, grouped by
    /// turbine id (ascending) and in input order within a turbine.
    pub fn detect(&self, data: &CleanedDataset) -> Result<CleanedDataset, AggregationError> {
        let groups = group_by_id(data, &self.config.id_column)?;
        let mut anomalies = data.empty_like();

        for (id, rows) in &groups {
            let values: Vec<f64> = rows.iter().map(|&r| data.records[r].power_output).collect();
            let Some(spread) = Spread::of(&values) else {
                continue;
            };
            // Undefined or zero spread: nothing can deviate.
            if spread.std_dev == 0.0 {
                continue;
            }

            let limit = self.config.z_threshold * spread.std_dev;
            let before = anomalies.records.len();
            for &row in rows {
                let record = &data.records[row];
                if (record.power_output - spread.mean).abs() > limit {
                    anomalies.records.push(record.clone());
                }
            }

            let flagged = anomalies.records.len() - before;
            if flagged > 0 {
                debug!("Turbine {} has {} anomalous readings", id, flagged);
            }
        }

        counter!("turbine_anomalies_total").increment(anomalies.len() as u64);
        info!("Anomalies detected: {} rows flagged", anomalies.len());
        Ok(anomalies)
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CleanedRecord;

    fn cleaned(rows: &[(&str, f64)]) -> CleanedDataset {
        CleanedDataset {
            columns: vec!["turbine_id".into(), "power_output".into(), "source_file".into()],
            records: rows
                .iter()
                .enumerate()
                .map(|(i, (id, v))| CleanedRecord {
                    cells: vec![id.to_string(), v.to_string(), format!("f{i}.csv")],
                    power_output: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn test_flags_local_outlier_with_all_attributes() {
        // Mean ~131.4, sample std ~89.1: the 400 reading is ~3 deviations out.
        let mut rows: Vec<(&str, f64)> = (0..10).map(|i| ("T1", 100.0 + i as f64)).collect();
        rows.push(("T1", 400.0));
        rows.push(("T2", 50.0));
        rows.push(("T2", 55.0));

        let anomalies = AnomalyDetector::new().detect(&cleaned(&rows)).unwrap();
        assert_eq!(anomalies.columns, vec!["turbine_id", "power_output", "source_file"]);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies.records[0].power_output, 400.0);
        assert_eq!(anomalies.records[0].cells[2], "f10.csv");
    }

    #[test]
    fn test_two_point_groups_never_flag() {
        // With two points each lies exactly 1/sqrt(2) sample deviations from the mean.
        let data = cleaned(&[("T1", 100.0), ("T1", 200.0), ("T2", 150.0), ("T2", 160.0)]);
        let anomalies = AnomalyDetector::new().detect(&data).unwrap();
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_constant_and_singleton_groups_emit_nothing() {
        let data = cleaned(&[("T1", 80.0), ("T1", 80.0), ("T1", 80.0), ("T2", 5.0)]);
        let anomalies = AnomalyDetector::new().detect(&data).unwrap();
        assert!(anomalies.is_empty());
        assert_eq!(anomalies.columns.len(), 3);
    }

    #[test]
    fn test_output_grouped_by_id_then_row_order() {
        let mut rows: Vec<(&str, f64)> = vec![("T2", 900.0)];
        rows.extend((0..10).map(|i| ("T2", 10.0 + i as f64)));
        rows.push(("T1", -500.0));
        rows.extend((0..10).map(|i| ("T1", 20.0 + i as f64)));
        rows.push(("T1", 700.0));

        let anomalies = AnomalyDetector::new().detect(&cleaned(&rows)).unwrap();
        let flagged: Vec<(String, f64)> = anomalies
            .records
            .iter()
            .map(|r| (r.cells[0].clone(), r.power_output))
            .collect();
        assert_eq!(
            flagged,
            vec![
                ("T1".to_string(), -500.0),
                ("T1".to_string(), 700.0),
                ("T2".to_string(), 900.0),
            ]
        );
    }

    #[test]
    fn test_missing_grouping_column() {
        let data = CleanedDataset {
            columns: vec!["power_output".into()],
            records: vec![],
        };
        assert!(AnomalyDetector::new().detect(&data).is_err());
    }
}
