use serde::Serialize;

/// Concatenated raw input: string cells aligned with `columns`.
///
/// Every row holds exactly `columns.len()` cells. An empty cell is a missing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row that survived global cleaning.
///
/// `cells` keeps every input column; the target column's cell has been
/// rewritten to the coerced (or imputed) value held in `power_output`.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
    pub cells: Vec<String>,
    pub power_output: f64,
}

/// Cleaned rows plus the column layout they share.
///
/// Anomaly detection returns the same shape restricted to flagged rows, so
/// `anomalies.csv` and `cleaned_data.csv` always carry identical headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedDataset {
    pub columns: Vec<String>,
    pub records: Vec<CleanedRecord>,
}

impl CleanedDataset {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Target values in row order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.power_output)
    }

    /// An empty dataset with the same columns.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            records: Vec::new(),
        }
    }
}

/// Per-turbine statistics of the cleaned target column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub turbine_id: String,
    pub min_power: f64,
    pub max_power: f64,
    pub avg_power: f64,
}

/// Renders a number the way every output file writes it: shortest
/// round-trip form, with a trailing `.0` for integral values.
pub fn format_value(value: f64) -> String {
    format!("{value:?}")
}
