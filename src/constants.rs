/// Column and file name constants shared by every stage and the CLI.

// Input columns
pub const TURBINE_ID_COLUMN: &str = "turbine_id";
pub const POWER_OUTPUT_COLUMN: &str = "power_output";

// Column appended by the loader
pub const SOURCE_FILE_COLUMN: &str = "source_file";

// Summary table columns
pub const MIN_POWER_COLUMN: &str = "min_power";
pub const MAX_POWER_COLUMN: &str = "max_power";
pub const AVG_POWER_COLUMN: &str = "avg_power";

pub const INPUT_EXTENSION: &str = "csv";

// Output file names
pub const CLEANED_DATA_FILE: &str = "cleaned_data.csv";
pub const SUMMARY_STATISTICS_FILE: &str = "summary_statistics.csv";
pub const ANOMALIES_FILE: &str = "anomalies.csv";
pub const SUMMARY_CHART_FILE: &str = "summary_statistics.png";

pub const DEFAULT_INPUT_DIR: &str = "./Data";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Both the global cleaning band and the per-turbine anomaly band default to two standard deviations.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

pub const CHART_TITLE: &str = "Summary Statistics per Turbine";

/// Header of `summary_statistics.csv`, in output order.
pub fn summary_columns() -> [&'static str; 4] {
    [
        TURBINE_ID_COLUMN,
        MIN_POWER_COLUMN,
        MAX_POWER_COLUMN,
        AVG_POWER_COLUMN,
    ]
}
