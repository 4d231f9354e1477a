pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod types;

pub use config::{ChartConfig, PipelineConfig};
pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineResult, ValidationReport};
