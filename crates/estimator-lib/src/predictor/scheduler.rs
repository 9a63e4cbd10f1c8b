//! Async training scheduler
//!
//! Training is the only slow operation in the estimator. The scheduler
//! moves it onto tokio's blocking pool so several categories can train in
//! parallel while the caller awaits, bounded by a concurrency limit.

use super::registry::ModelRegistry;
use crate::error::{EstimatorError, Result};
use crate::models::{Category, PredictionResult, ProjectInput, TrainingDiagnostics};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Default number of categories trained at the same time
pub const DEFAULT_MAX_CONCURRENT_TRAININGS: usize = 4;

/// Outcome of one scheduled training
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub category: Category,
    pub diagnostics: Option<TrainingDiagnostics>,
    pub error: Option<String>,
    pub duration_us: u64,
}

impl TrainingOutcome {
    pub fn succeeded(&self) -> bool {
        self.diagnostics.is_some()
    }
}

/// Runs registry training and prediction off the async executor
#[derive(Clone)]
pub struct TrainingScheduler {
    registry: Arc<ModelRegistry>,
    permits: Arc<Semaphore>,
}

impl TrainingScheduler {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self::with_concurrency(registry, DEFAULT_MAX_CONCURRENT_TRAININGS)
    }

    pub fn with_concurrency(registry: Arc<ModelRegistry>, max_concurrent: usize) -> Self {
        Self {
            registry,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Train one category on the blocking pool
    pub async fn train(
        &self,
        category: Category,
        epochs: usize,
        batch_size: usize,
    ) -> TrainingOutcome {
        let start = Instant::now();
        let (diagnostics, error) = match self.permits.clone().acquire_owned().await {
            Ok(permit) => {
                let registry = Arc::clone(&self.registry);
                let joined = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    registry.train_with(category, epochs, batch_size)
                })
                .await;
                match joined {
                    Ok(Ok(d)) => (Some(d), None),
                    Ok(Err(e)) => (None, Some(e.to_string())),
                    Err(e) => (None, Some(format!("training task failed: {}", e))),
                }
            }
            Err(e) => (None, Some(format!("scheduler closed: {}", e))),
        };

        if let Some(e) = &error {
            warn!(category = %category, error = %e, "Scheduled training failed");
        }

        TrainingOutcome {
            category,
            diagnostics,
            error,
            duration_us: start.elapsed().as_micros() as u64,
        }
    }

    /// Train several categories concurrently, returning outcomes in input order
    pub async fn train_all(
        &self,
        categories: &[Category],
        epochs: usize,
        batch_size: usize,
    ) -> Vec<TrainingOutcome> {
        info!(
            categories = categories.len(),
            epochs = epochs,
            "Starting scheduled training"
        );
        let handles: Vec<_> = categories
            .iter()
            .map(|category| {
                let scheduler = self.clone();
                let category = *category;
                tokio::spawn(async move { scheduler.train(category, epochs, batch_size).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (handle, category) in handles.into_iter().zip(categories) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => TrainingOutcome {
                    category: *category,
                    diagnostics: None,
                    error: Some(format!("training task failed: {}", e)),
                    duration_us: 0,
                },
            };
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
        info!(
            trained = outcomes.len() - failed,
            failed = failed,
            "Scheduled training finished"
        );
        outcomes
    }

    /// Predict on the blocking pool, training lazily if needed
    pub async fn predict(&self, input: ProjectInput) -> Result<PredictionResult> {
        let category = input.category;
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || registry.predict(&input))
            .await
            .map_err(|e| EstimatorError::UntrainedModel {
                category,
                reason: format!("prediction task failed: {}", e),
            })?
    }
}
