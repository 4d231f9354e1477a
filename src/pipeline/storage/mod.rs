// Pipeline storage: delimited output files and the summary chart

pub mod chart;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::ChartConfig;
use crate::constants::{
    summary_columns, ANOMALIES_FILE, CLEANED_DATA_FILE, SUMMARY_CHART_FILE,
    SUMMARY_STATISTICS_FILE,
};
use crate::error::PersistenceError;
use crate::types::{format_value, CleanedDataset, SummaryRow};

pub use chart::{BarChartRenderer, ChartRenderer};

/// Paths written by a successful `Persister::save`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedOutputs {
    pub cleaned_data: PathBuf,
    pub summary_statistics: PathBuf,
    pub anomalies: PathBuf,
    pub chart: PathBuf,
}

impl PersistedOutputs {
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            cleaned_data: output_dir.join(CLEANED_DATA_FILE),
            summary_statistics: output_dir.join(SUMMARY_STATISTICS_FILE),
            anomalies: output_dir.join(ANOMALIES_FILE),
            chart: output_dir.join(SUMMARY_CHART_FILE),
        }
    }
}

/// Writes the three result tables and the chart into one output directory.
pub struct Persister {
    output_dir: PathBuf,
    renderer: Box<dyn ChartRenderer>,
}

impl Persister {
    pub fn new(output_dir: impl Into<PathBuf>, chart: ChartConfig) -> Self {
        Self::with_renderer(output_dir, Box::new(BarChartRenderer::new(chart)))
    }

    pub fn with_renderer(output_dir: impl Into<PathBuf>, renderer: Box<dyn ChartRenderer>) -> Self {
        Self {
            output_dir: output_dir.into(),
            renderer,
        }
    }

    /// Writes every output, overwriting previous runs.
    ///
    /// Files are written in order; a failure leaves earlier files in place.
    pub fn save(
        &self,
        cleaned: &CleanedDataset,
        summary: &[SummaryRow],
        anomalies: &CleanedDataset,
    ) -> Result<PersistedOutputs, PersistenceError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| PersistenceError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;
        let outputs = PersistedOutputs::in_dir(&self.output_dir);

        write_records(&outputs.cleaned_data, cleaned)?;
        info!("Cleaned data saved to {}", outputs.cleaned_data.display());

        write_summary(&outputs.summary_statistics, summary)?;
        info!("Summary statistics saved to {}", outputs.summary_statistics.display());

        write_records(&outputs.anomalies, anomalies)?;
        info!("Anomalies saved to {}", outputs.anomalies.display());

        if let Err(e) = self.renderer.render(summary, &outputs.chart) {
            error!("Chart rendering failed; table outputs were kept: {}", e);
            return Err(e);
        }
        info!("Visualization saved to {}", outputs.chart.display());

        Ok(outputs)
    }
}

/// Writes a header row followed by each record's cells.
pub fn write_records(path: &Path, data: &CleanedDataset) -> Result<(), PersistenceError> {
    let write_err = |source: csv::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer.write_record(&data.columns).map_err(write_err)?;
    for record in &data.records {
        writer.write_record(&record.cells).map_err(write_err)?;
    }
    writer.flush().map_err(|source| PersistenceError::Flush {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `turbine_id,min_power,max_power,avg_power` rows.
pub fn write_summary(path: &Path, summary: &[SummaryRow]) -> Result<(), PersistenceError> {
    let write_err = |source: csv::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer.write_record(summary_columns()).map_err(write_err)?;
    for row in summary {
        writer
            .write_record([
                row.turbine_id.clone(),
                format_value(row.min_power),
                format_value(row.max_power),
                format_value(row.avg_power),
            ])
            .map_err(write_err)?;
    }
    writer.flush().map_err(|source| PersistenceError::Flush {
        path: path.to_path_buf(),
        source,
    })
}
