//! Descriptive statistics shared by cleaning and anomaly detection.
//!
//! Standard deviations use the sample estimator (n - 1 denominator) everywhere,
//! so the global band and the per-turbine band are measured the same way.

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation around `mean`, or `None` with fewer than two values.
pub fn sample_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Location and spread of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub mean: f64,
    /// Zero when undefined (fewer than two values) or all values are equal.
    pub std_dev: f64,
}

impl Spread {
    pub fn of(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let std_dev = sample_std_dev(values, mean).unwrap_or(0.0);
        Some(Self { mean, std_dev })
    }

    /// `(value - mean) / std_dev`, defined as 0 when there is no spread.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std_dev == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}
