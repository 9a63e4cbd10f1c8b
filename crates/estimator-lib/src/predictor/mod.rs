//! Learned estimation engine
//!
//! One small dense regressor per project category, trained on synthetic
//! samples and wrapped with normalisation and derived-metric post-processing.

mod features;
mod network;
mod normalization;
mod output;
mod registry;
mod scheduler;
mod synthesis;

pub use features::{
    area_ratios, effective_ratio, FeatureExtractor, LOW_RISE_MAX_FLOORS, MARKET_LEVEL_RANGE,
    MIN_PREDICTION_FLOORS, TRAINING_FLOOR_RANGE, TRAINING_LAND_AREA_RANGE,
};
pub use network::{DenseNetwork, FitError, FitHistory, FitOptions, DEFAULT_HIDDEN_LAYERS};
pub use normalization::ColumnStats;
pub use output::{
    outlook_score, payback_period, OutputConfig, OutputFormatter, DESIGN_RATE, LICENSING_RATE,
    MANAGEMENT_RATE,
};
pub use registry::{
    ModelEntry, ModelRegistry, TrainingConfig, DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS,
};
pub use scheduler::{TrainingOutcome, TrainingScheduler, DEFAULT_MAX_CONCURRENT_TRAININGS};
pub use synthesis::{SampleSynthesizer, DEFAULT_SAMPLE_COUNT, NOISE_STD};
