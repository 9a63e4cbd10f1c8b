//! Per-column standardisation statistics

use crate::error::{ColumnKind, EstimatorError, Result};
use crate::models::Category;

/// Mean and population standard deviation of each column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats<const N: usize> {
    pub mean: [f64; N],
    pub std: [f64; N],
}

impl<const N: usize> ColumnStats<N> {
    /// Identity statistics (mean 0, std 1), used by untrained entries
    pub fn identity() -> Self {
        Self {
            mean: [0.0; N],
            std: [1.0; N],
        }
    }

    /// Compute statistics over a batch, rejecting zero-variance columns
    pub fn fit(rows: &[[f64; N]], category: Category, kind: ColumnKind) -> Result<Self> {
        if rows.is_empty() {
            return Err(EstimatorError::InvalidInput(format!(
                "{}: cannot compute {} statistics over an empty batch",
                category, kind
            )));
        }
        let n = rows.len() as f64;
        let mut mean = [0.0; N];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut std = [0.0; N];
        for row in rows {
            for ((s, v), m) in std.iter_mut().zip(row).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        for (column, s) in std.iter_mut().enumerate() {
            *s = (*s / n).sqrt();
            if !(s.is_finite() && *s > 0.0) {
                return Err(EstimatorError::DegenerateNormalization {
                    category,
                    kind,
                    column,
                });
            }
        }
        Ok(Self { mean, std })
    }

    pub fn normalize(&self, row: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| (row[i] - self.mean[i]) / self.std[i])
    }

    pub fn denormalize(&self, row: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| row[i] * self.std[i] + self.mean[i])
    }
}
