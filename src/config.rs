use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_Z_THRESHOLD};
use crate::error::ConfigError;

/// Everything a pipeline run needs, passed explicitly into `Pipeline::run`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Rows with a dataset-wide |z| above this are dropped during cleaning.
    pub clean_z_threshold: f64,
    /// Rows deviating more than this many per-turbine standard deviations are flagged.
    pub anomaly_z_threshold: f64,
    /// Directory for the JSON rolling log; console only when unset.
    pub log_dir: Option<PathBuf>,
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// TrueType/OpenType font for titles, labels and legend.
    pub font_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            clean_z_threshold: DEFAULT_Z_THRESHOLD,
            anomaly_z_threshold: DEFAULT_Z_THRESHOLD,
            log_dir: None,
            chart: ChartConfig::default(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            font_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Reads a TOML config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("clean_z_threshold", self.clean_z_threshold),
            ("anomaly_z_threshold", self.anomaly_z_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "chart dimensions must be non-zero, got {}x{}",
                self.chart.width, self.chart.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("./Data"));
        assert_eq!(config.output_dir, PathBuf::from("./output"));
        assert_eq!(config.clean_z_threshold, 2.0);
        assert_eq!(config.anomaly_z_threshold, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            input_dir = "readings"

            [chart]
            width = 1280
            "#,
        )
        .unwrap();

        assert_eq!(config.input_dir, PathBuf::from("readings"));
        assert_eq!(config.output_dir, PathBuf::from("./output"));
        assert_eq!(config.chart.width, 1280);
        assert_eq!(config.chart.height, 600);
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let err = PipelineConfig::from_toml_str("anomaly_z_threshold = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = PipelineConfig::from_toml_str("inptu_dir = \"typo\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
