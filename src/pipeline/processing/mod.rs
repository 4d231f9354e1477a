// Pipeline processing: cleaning, summary statistics and anomaly flagging

pub mod aggregate;
pub mod anomaly;
pub mod clean;
pub mod grouping;
pub mod stats;

pub use aggregate::summarize;
pub use anomaly::{AnomalyConfig, AnomalyDetector};
pub use clean::{Cleaner, CleaningConfig, CleaningOutcome};
