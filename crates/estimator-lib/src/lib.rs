//! Estimator library for real-estate development financials
//!
//! This crate provides the core functionality for:
//! - Per-category feature extraction and synthetic training data
//! - Training and querying small dense regressors, one per category
//! - Derived investment metrics and structured reports
//! - Metrics and structured logging

pub mod error;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod pricing;
pub mod report;

pub use error::{ColumnKind, EstimatorError, Result};
pub use models::*;
pub use observability::{EstimatorMetrics, StructuredLogger};
pub use predictor::{ModelRegistry, TrainingConfig, TrainingScheduler};
pub use pricing::{CategoryBaseCost, LocationPriceTable};
pub use report::InvestmentReport;
