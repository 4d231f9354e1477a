// Data processing pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod processing;
pub mod storage;

use chrono::{DateTime, Utc};
use metrics::histogram;
use serde::Serialize;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::processing::{
    summarize, AnomalyConfig, AnomalyDetector, Cleaner, CleaningConfig, CleaningOutcome,
};
use crate::pipeline::storage::{PersistedOutputs, Persister};
use crate::types::Dataset;

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows_ingested: usize,
    pub values_imputed: usize,
    pub rows_retained: usize,
    pub rows_dropped: usize,
    pub turbines_summarized: usize,
    pub anomalies_flagged: usize,
    pub outputs: PersistedOutputs,
}

/// Counts from the ingest and clean stages only; nothing is written.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub files_found: usize,
    pub columns: Vec<String>,
    pub rows_ingested: usize,
    pub values_imputed: usize,
    pub rows_retained: usize,
    pub rows_dropped: usize,
    pub global_mean: Option<f64>,
    pub global_std_dev: Option<f64>,
}

/// Runs ingest → clean → summarize / detect → persist with one configuration.
pub struct Pipeline {
    config: PipelineConfig,
    persister: Persister,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let persister = Persister::new(&config.output_dir, config.chart.clone());
        Self { config, persister }
    }

    /// Uses a custom persister, e.g. one with a different chart renderer.
    pub fn with_persister(config: PipelineConfig, persister: Persister) -> Self {
        Self { config, persister }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn cleaner(&self) -> Cleaner {
        Cleaner::with_config(CleaningConfig {
            z_threshold: self.config.clean_z_threshold,
            ..CleaningConfig::default()
        })
    }

    fn detector(&self) -> AnomalyDetector {
        AnomalyDetector::with_config(AnomalyConfig {
            z_threshold: self.config.anomaly_z_threshold,
            ..AnomalyConfig::default()
        })
    }

    fn ingest_and_clean(&self) -> Result<(Dataset, CleaningOutcome)> {
        let raw = ingestion::load_dataset(&self.config.input_dir)?;
        let cleaned = self.cleaner().clean(&raw)?;
        Ok((raw, cleaned))
    }

    /// Run the complete pipeline. Any stage failure aborts the remaining stages.
    pub fn run(&self) -> Result<PipelineResult> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", run_id = %run_id);
        let _enter = span.enter();

        let started_at = Utc::now();
        let t_pipeline = std::time::Instant::now();
        info!(
            "Starting pipeline: {} -> {}",
            self.config.input_dir.display(),
            self.config.output_dir.display()
        );

        let (raw, cleaning) = self.ingest_and_clean()?;
        let summary = summarize(&cleaning.data)?;
        let anomalies = self.detector().detect(&cleaning.data)?;
        let outputs = self.persister.save(&cleaning.data, &summary, &anomalies)?;

        histogram!("turbine_pipeline_duration_seconds").record(t_pipeline.elapsed().as_secs_f64());
        info!("Pipeline executed successfully");

        Ok(PipelineResult {
            run_id,
            started_at,
            finished_at: Utc::now(),
            rows_ingested: raw.len(),
            values_imputed: cleaning.imputed,
            rows_retained: cleaning.data.len(),
            rows_dropped: cleaning.dropped,
            turbines_summarized: summary.len(),
            anomalies_flagged: anomalies.len(),
            outputs,
        })
    }

    /// Ingests and cleans without writing anything.
    pub fn validate(&self) -> Result<ValidationReport> {
        self.config.validate()?;
        let files_found = ingestion::discover_input_files(&self.config.input_dir)?.len();
        let (raw, cleaning) = self.ingest_and_clean()?;

        Ok(ValidationReport {
            files_found,
            columns: raw.columns.clone(),
            rows_ingested: raw.len(),
            values_imputed: cleaning.imputed,
            rows_retained: cleaning.data.len(),
            rows_dropped: cleaning.dropped,
            global_mean: cleaning.spread.map(|s| s.mean),
            global_std_dev: cleaning.spread.map(|s| s.std_dev),
        })
    }
}
