//! Observability for the estimator
//!
//! Provides:
//! - Prometheus metrics (training duration, prediction latency, per-category counters)
//! - Structured logging of training and prediction events with tracing

use crate::models::{Category, PredictionResult, TrainingDiagnostics};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
];

/// Histogram buckets for training duration (in seconds)
const TRAINING_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

struct MetricsInner {
    registry: Registry,
    training_duration_seconds: Histogram,
    prediction_latency_seconds: Histogram,
    trainings_total: IntCounterVec,
    training_failures_total: IntCounterVec,
    predictions_total: IntCounterVec,
    trained_models: IntGauge,
}

impl MetricsInner {
    // Registration only fails on duplicate names, which a fresh registry cannot have.
    fn new() -> Self {
        let registry = Registry::new();

        let training_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "estimator_training_duration_seconds",
                "Time spent training one category model",
            )
            .buckets(TRAINING_BUCKETS.to_vec()),
        )
        .expect("valid training_duration_seconds options");

        let prediction_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "estimator_prediction_latency_seconds",
                "Time spent normalising, running and post-processing one prediction",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
        )
        .expect("valid prediction_latency_seconds options");

        let trainings_total = IntCounterVec::new(
            Opts::new("estimator_trainings_total", "Completed category trainings"),
            &["category"],
        )
        .expect("valid trainings_total options");

        let training_failures_total = IntCounterVec::new(
            Opts::new(
                "estimator_training_failures_total",
                "Category trainings that ended in an error",
            ),
            &["category"],
        )
        .expect("valid training_failures_total options");

        let predictions_total = IntCounterVec::new(
            Opts::new("estimator_predictions_total", "Predictions generated"),
            &["category"],
        )
        .expect("valid predictions_total options");

        let trained_models = IntGauge::new(
            "estimator_trained_models",
            "Number of categories with a trained model",
        )
        .expect("valid trained_models options");

        registry
            .register(Box::new(training_duration_seconds.clone()))
            .expect("register training_duration_seconds");
        registry
            .register(Box::new(prediction_latency_seconds.clone()))
            .expect("register prediction_latency_seconds");
        registry
            .register(Box::new(trainings_total.clone()))
            .expect("register trainings_total");
        registry
            .register(Box::new(training_failures_total.clone()))
            .expect("register training_failures_total");
        registry
            .register(Box::new(predictions_total.clone()))
            .expect("register predictions_total");
        registry
            .register(Box::new(trained_models.clone()))
            .expect("register trained_models");

        Self {
            registry,
            training_duration_seconds,
            prediction_latency_seconds,
            trainings_total,
            training_failures_total,
            predictions_total,
            trained_models,
        }
    }
}

/// Estimator metrics for Prometheus exposition
///
/// Each instance owns its own registry; clones share it.
#[derive(Clone)]
pub struct EstimatorMetrics {
    inner: Arc<MetricsInner>,
}

impl Default for EstimatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::new()),
        }
    }

    pub fn observe_training(&self, category: Category, duration_secs: f64) {
        self.inner.training_duration_seconds.observe(duration_secs);
        self.inner
            .trainings_total
            .with_label_values(&[category.slug()])
            .inc();
    }

    pub fn inc_training_failures(&self, category: Category) {
        self.inner
            .training_failures_total
            .with_label_values(&[category.slug()])
            .inc();
    }

    pub fn observe_prediction(&self, category: Category, duration_secs: f64) {
        self.inner.prediction_latency_seconds.observe(duration_secs);
        self.inner
            .predictions_total
            .with_label_values(&[category.slug()])
            .inc();
    }

    pub fn set_trained_models(&self, count: i64) {
        self.inner.trained_models.set(count);
    }

    pub fn trainings(&self, category: Category) -> u64 {
        self.inner
            .trainings_total
            .with_label_values(&[category.slug()])
            .get()
    }

    pub fn predictions(&self, category: Category) -> u64 {
        self.inner
            .predictions_total
            .with_label_values(&[category.slug()])
            .get()
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.inner.registry.gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for estimator events
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn log_training(&self, diagnostics: &TrainingDiagnostics) {
        info!(
            event = "model_trained",
            source = %self.source,
            category = %diagnostics.category,
            epochs = diagnostics.epochs,
            train_samples = diagnostics.train_samples,
            validation_samples = diagnostics.validation_samples,
            final_loss = ?diagnostics.final_train_loss(),
            final_val_loss = ?diagnostics.final_val_loss(),
            duration_ms = diagnostics.duration_ms,
            "Category model trained"
        );
    }

    pub fn log_training_failed(&self, category: Category, error: &str) {
        warn!(
            event = "training_failed",
            source = %self.source,
            category = %category,
            error = %error,
            "Category model training failed"
        );
    }

    pub fn log_prediction(&self, location: &str, result: &PredictionResult) {
        info!(
            event = "prediction_generated",
            source = %self.source,
            category = %result.category,
            location = %location,
            total_cost = result.total_cost,
            sales_revenue = result.sales_revenue,
            rental_revenue = result.rental_revenue,
            roi = result.roi,
            payback_period = result.payback_period,
            risk = result.risk_tier.as_str(),
            outlook = result.market_outlook.as_str(),
            "Generated financial estimate"
        );
    }
}
