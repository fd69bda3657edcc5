//! Threshold-based outlier removal.

use crate::error::{BrammError, Result};
use bramm_types::table::PointTable;

/// A per-row acceptance test on one column.
pub trait Threshold {
    fn field(&self) -> &str;

    /// One flag per row, true when the row passes.
    ///
    /// Missing and non-numeric values never pass.
    fn check(&self, table: &PointTable) -> Result<Vec<bool>>;
}

fn numeric_column(table: &PointTable, field: &str) -> Result<Vec<Option<f64>>> {
    let column = table
        .column(field)
        .ok_or_else(|| BrammError::missing_column(field))?;
    Ok(column.into_iter().map(|v| v.as_f64()).collect())
}

fn within(values: &[Option<f64>], lower: f64, upper: f64) -> Vec<bool> {
    values
        .iter()
        .map(|v| v.is_some_and(|v| v >= lower && v <= upper))
        .collect()
}

/// Accepts values in `[lower, upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueThreshold {
    pub field: String,
    pub lower: f64,
    pub upper: f64,
}

impl ValueThreshold {
    pub fn new(field: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            field: field.into(),
            lower,
            upper,
        }
    }
}

impl Threshold for ValueThreshold {
    fn field(&self) -> &str {
        &self.field
    }

    fn check(&self, table: &PointTable) -> Result<Vec<bool>> {
        let values = numeric_column(table, &self.field)?;
        Ok(within(&values, self.lower, self.upper))
    }
}

/// Accepts values between two quantiles of the column itself.
///
/// Quantiles are linearly interpolated between the sorted non-missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileThreshold {
    pub field: String,
    pub lower: f64,
    pub upper: f64,
}

impl QuantileThreshold {
    pub fn new(field: impl Into<String>, lower: f64, upper: f64) -> Result<Self> {
        for q in [lower, upper] {
            if !(0.0..=1.0).contains(&q) {
                return Err(BrammError::InvalidConfig(format!(
                    "Quantile must be within [0, 1], got {}",
                    q
                )));
            }
        }
        if lower > upper {
            return Err(BrammError::InvalidConfig(format!(
                "Lower quantile {} exceeds upper quantile {}",
                lower, upper
            )));
        }
        Ok(Self {
            field: field.into(),
            lower,
            upper,
        })
    }
}

/// Quantile `q` of ascending `sorted`, which must not be empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let below = pos.floor() as usize;
    let above = pos.ceil() as usize;
    sorted[below] + (sorted[above] - sorted[below]) * (pos - below as f64)
}

impl Threshold for QuantileThreshold {
    fn field(&self) -> &str {
        &self.field
    }

    fn check(&self, table: &PointTable) -> Result<Vec<bool>> {
        let values = numeric_column(table, &self.field)?;

        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        if sorted.is_empty() {
            return Ok(vec![false; values.len()]);
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let lower = quantile(&sorted, self.lower);
        let upper = quantile(&sorted, self.upper);
        log::debug!(
            "Quantile bounds on '{}': [{}, {}]",
            self.field,
            lower,
            upper
        );
        Ok(within(&values, lower, upper))
    }
}

/// Filters a table down to the rows passing a set of thresholds.
#[derive(Debug, Clone)]
pub struct OutlierRemoval {
    table: PointTable,
}

impl OutlierRemoval {
    pub fn new(table: PointTable) -> Self {
        Self { table }
    }

    pub fn data(&self) -> &PointTable {
        &self.table
    }

    /// Rows passing every threshold. No thresholds keeps every row.
    pub fn apply_thresholds(&self, thresholds: &[&dyn Threshold]) -> Result<PointTable> {
        let mut keep = vec![true; self.table.len()];
        for threshold in thresholds {
            for (flag, pass) in keep.iter_mut().zip(threshold.check(&self.table)?) {
                *flag &= pass;
            }
        }

        let kept = self.table.filter_mask(&keep);
        log::info!(
            "Outlier removal kept {} of {} rows",
            kept.len(),
            self.table.len()
        );
        Ok(kept)
    }
}
