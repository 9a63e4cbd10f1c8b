//! Error taxonomy for training and estimation

use crate::models::Category;
use thiserror::Error;

/// Whether a degenerate column belongs to the feature or the target matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Feature,
    Target,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Feature => f.write_str("feature"),
            ColumnKind::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("unknown location '{0}'")]
    UnknownLocation(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{category}: {kind} column {column} has zero standard deviation")]
    DegenerateNormalization {
        category: Category,
        kind: ColumnKind,
        column: usize,
    },

    #[error("{category}: training diverged at epoch {epoch} (loss {loss})")]
    TrainingDiverged {
        category: Category,
        epoch: usize,
        loss: f64,
    },

    #[error("{category}: model is not trained: {reason}")]
    UntrainedModel { category: Category, reason: String },

    #[error("{category}: model lock poisoned")]
    LockPoisoned { category: Category },
}

impl EstimatorError {
    /// True for errors caused by the caller's request rather than model state
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EstimatorError::UnknownLocation(_) | EstimatorError::InvalidInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
