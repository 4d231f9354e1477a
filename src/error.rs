use std::path::PathBuf;
use thiserror::Error;

/// Failures while discovering or parsing the input files.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("input directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("no .csv files found in {0}")]
    NoInputFiles(PathBuf),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{0} has an empty header row")]
    EmptyHeader(PathBuf),

    #[error("{path} declares column '{column}' more than once")]
    DuplicateColumn { path: PathBuf, column: String },

    #[error("{path} line {line}: expected at most {expected} fields, found {found}")]
    TooManyFields {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum CleaningError {
    #[error("required column '{0}' is missing")]
    MissingColumn(String),
}

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("grouping column '{0}' is missing")]
    MissingColumn(String),
}

/// Failures while writing outputs. Files written before the failure are left in place.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to flush {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render chart {path}: {message}")]
    Render { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A failed pipeline run, tagged with the stage that failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("ingest stage failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("cleaning stage failed: {0}")]
    Cleaning(#[from] CleaningError),

    #[error("aggregation stage failed: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("persistence stage failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Ingest(_) => "ingest",
            PipelineError::Cleaning(_) => "clean",
            PipelineError::Aggregation(_) => "aggregate",
            PipelineError::Persistence(_) => "persist",
            PipelineError::Config(_) => "config",
        }
    }

    /// Process exit status for this failure. Zero is reserved for success.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Ingest(_) => 2,
            PipelineError::Cleaning(_) => 3,
            PipelineError::Aggregation(_) => 4,
            PipelineError::Persistence(_) => 5,
            PipelineError::Config(_) => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
