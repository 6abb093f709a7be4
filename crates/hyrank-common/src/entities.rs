/// Core data-model types consumed by every ranking stage.
/// Both are immutable once constructed; stages derive new values instead of mutating.

use std::collections::HashSet;
use std::ops::Range;

use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{HyrankError, Result};

// ---------------------------------------------------------------------------
// Feature matrix
// ---------------------------------------------------------------------------

/// Time-ordered numeric panel: one row per trading day, one named column per feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
    dates: Option<Vec<NaiveDate>>,
}

impl FeatureMatrix {
    /// Build a matrix, enforcing unique column names and finite cells.
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(HyrankError::InputContract(format!(
                "{} column names for {} matrix columns",
                names.len(),
                values.ncols()
            )));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(HyrankError::InputContract(format!(
                    "duplicate feature column '{name}'"
                )));
            }
        }

        for ((row, col), v) in values.indexed_iter() {
            if !v.is_finite() {
                return Err(HyrankError::InputContract(format!(
                    "non-finite value {v} at row {row}, column '{}'",
                    names[col]
                )));
            }
        }

        Ok(Self { names, values, dates: None })
    }

    /// Build from column vectors, keeping the supplied column order.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let n_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        if let Some((name, col)) = columns.iter().find(|(_, c)| c.len() != n_rows) {
            return Err(HyrankError::InputContract(format!(
                "column '{name}' has {} rows, expected {n_rows}",
                col.len()
            )));
        }

        let mut values = Array2::<f64>::zeros((n_rows, columns.len()));
        let mut names = Vec::with_capacity(columns.len());
        for (j, (name, col)) in columns.into_iter().enumerate() {
            for (i, v) in col.into_iter().enumerate() {
                values[[i, j]] = v;
            }
            names.push(name);
        }
        Self::new(names, values)
    }

    /// Attach a trading-date index. Dates must be strictly increasing.
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.len() != self.n_rows() {
            return Err(HyrankError::InputContract(format!(
                "{} dates for {} rows",
                dates.len(),
                self.n_rows()
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(HyrankError::InputContract(format!(
                "rows are not in time order: {} is followed by {}",
                w[0], w[1]
            )));
        }
        self.dates = Some(dates);
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column_by_name(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.position(name).map(|j| self.column(j))
    }

    /// Keep only the given columns, in the given order.
    pub fn select_columns(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            names: indices.iter().map(|&j| self.names[j].clone()).collect(),
            values: self.values.select(Axis(1), indices),
            dates: self.dates.clone(),
        }
    }

    /// Contiguous block of rows, preserving time order.
    pub fn slice_rows(&self, rows: Range<usize>) -> FeatureMatrix {
        let idx: Vec<usize> = rows.clone().collect();
        FeatureMatrix {
            names: self.names.clone(),
            values: self.values.select(Axis(0), &idx),
            dates: self.dates.as_ref().map(|d| d[rows].to_vec()),
        }
    }
}

// ---------------------------------------------------------------------------
// Target vector
// ---------------------------------------------------------------------------

/// Binary direction label aligned row-for-row with a [`FeatureMatrix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetVector {
    labels: Vec<u8>,
}

impl TargetVector {
    pub fn new(labels: Vec<u8>) -> Result<Self> {
        if let Some((i, v)) = labels.iter().enumerate().find(|(_, &v)| v > 1) {
            return Err(HyrankError::InputContract(format!(
                "target value {v} at row {i} is not 0/1"
            )));
        }
        Ok(Self { labels })
    }

    /// Parse a float column holding exactly 0.0 / 1.0.
    pub fn from_f64(values: &[f64]) -> Result<Self> {
        let labels = values
            .iter()
            .enumerate()
            .map(|(i, &v)| match v {
                x if x == 0.0 => Ok(0u8),
                x if x == 1.0 => Ok(1u8),
                other => Err(HyrankError::InputContract(format!(
                    "target value {other} at row {i} is not 0/1"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn as_f64(&self) -> Vec<f64> {
        self.labels.iter().map(|&l| l as f64).collect()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    pub fn negatives(&self) -> usize {
        self.len() - self.positives()
    }

    pub fn slice(&self, rows: Range<usize>) -> TargetVector {
        TargetVector { labels: self.labels[rows].to_vec() }
    }
}

/// Check the row alignment every ranking stage relies on.
pub fn ensure_aligned(matrix: &FeatureMatrix, target: &TargetVector) -> Result<()> {
    if matrix.n_rows() != target.len() {
        return Err(HyrankError::InputContract(format!(
            "feature matrix has {} rows but target has {}",
            matrix.n_rows(),
            target.len()
        )));
    }
    if matrix.n_features() == 0 {
        return Err(HyrankError::InputContract("feature matrix has no columns".into()));
    }
    if matrix.n_rows() < 2 {
        return Err(HyrankError::InputContract(format!(
            "need at least 2 rows, got {}",
            matrix.n_rows()
        )));
    }
    Ok(())
}
