//! Per-category model registry and training lifecycle
//!
//! The registry owns one [`ModelEntry`] per [`Category`], each behind its
//! own mutex. Training or predicting for one category never blocks or
//! corrupts another, and a registry is an ordinary value: tests and callers
//! can hold as many independent registries as they like.

use super::features::FeatureExtractor;
use super::network::{DenseNetwork, FitError, FitOptions, DEFAULT_HIDDEN_LAYERS};
use super::normalization::ColumnStats;
use super::output::{OutputConfig, OutputFormatter};
use super::synthesis::{SampleSynthesizer, DEFAULT_SAMPLE_COUNT};
use crate::error::{ColumnKind, EstimatorError, Result};
use crate::models::{
    Category, FinancialTargets, MarketConditions, ModelStatus, PredictionResult, ProjectInput,
    TrainingDiagnostics, NUM_FEATURES, NUM_TARGETS,
};
use crate::observability::{EstimatorMetrics, StructuredLogger};
use crate::pricing::{CategoryBaseCost, LocationPriceTable};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info};

/// Epoch count used by lazy training
pub const DEFAULT_EPOCHS: usize = 50;

/// Mini-batch size used when none is given
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Training settings shared by every category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Synthetic samples generated per training run
    pub sample_count: usize,
    /// Epochs used when a category is trained lazily
    pub default_epochs: usize,
    pub batch_size: usize,
    pub validation_split: f64,
    pub learning_rate: f64,
    pub hidden_layers: Vec<usize>,
    /// Fixed seed for reproducible training; `None` draws fresh entropy
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            default_epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            validation_split: 0.2,
            learning_rate: 1e-3,
            hidden_layers: DEFAULT_HIDDEN_LAYERS.to_vec(),
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_default_epochs(mut self, epochs: usize) -> Self {
        self.default_epochs = epochs;
        self
    }

    /// Random stream for `category`, created once and advanced by every training
    fn rng_for(&self, category: Category) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(category.index() as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

/// One category's regressor, normalisation statistics and lifecycle state
#[derive(Debug, Clone)]
pub struct ModelEntry {
    category: Category,
    network: Option<DenseNetwork>,
    input_stats: ColumnStats<NUM_FEATURES>,
    output_stats: ColumnStats<NUM_TARGETS>,
    trained: bool,
    diagnostics: Option<TrainingDiagnostics>,
    last_error: Option<String>,
    rng: StdRng,
}

impl ModelEntry {
    fn new(category: Category, rng: StdRng) -> Self {
        Self {
            category,
            rng,
            network: None,
            input_stats: ColumnStats::identity(),
            output_stats: ColumnStats::identity(),
            trained: false,
            diagnostics: None,
            last_error: None,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn input_stats(&self) -> &ColumnStats<NUM_FEATURES> {
        &self.input_stats
    }

    pub fn output_stats(&self) -> &ColumnStats<NUM_TARGETS> {
        &self.output_stats
    }

    pub fn diagnostics(&self) -> Option<&TrainingDiagnostics> {
        self.diagnostics.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn status(&self) -> ModelStatus {
        ModelStatus {
            category: self.category,
            trained: self.trained,
            trained_at: self.diagnostics.as_ref().map(|d| d.trained_at),
            last_error: self.last_error.clone(),
        }
    }

    /// Normalise, run the regressor and denormalise
    fn infer(&self, features: &[f64; NUM_FEATURES]) -> Result<FinancialTargets> {
        let network = match (&self.network, self.trained) {
            (Some(network), true) => network,
            _ => {
                return Err(EstimatorError::UntrainedModel {
                    category: self.category,
                    reason: self
                        .last_error
                        .clone()
                        .unwrap_or_else(|| "no training has completed".to_string()),
                })
            }
        };
        let x = self.input_stats.normalize(features);
        let y = network.forward(&x);
        let mut normalized = [0.0; NUM_TARGETS];
        for (slot, value) in normalized.iter_mut().zip(&y) {
            *slot = *value;
        }
        Ok(FinancialTargets::from_array(
            self.output_stats.denormalize(&normalized),
        ))
    }
}

/// Registry of independent per-category models
pub struct ModelRegistry {
    entries: Vec<Mutex<ModelEntry>>,
    prices: LocationPriceTable,
    base_costs: CategoryBaseCost,
    config: TrainingConfig,
    extractor: FeatureExtractor,
    formatter: OutputFormatter,
    metrics: EstimatorMetrics,
    logger: StructuredLogger,
    trained_count: AtomicUsize,
}

impl ModelRegistry {
    /// Registry over the default location and base-cost tables
    pub fn new(config: TrainingConfig) -> Self {
        Self::with_tables(
            LocationPriceTable::default(),
            CategoryBaseCost::default(),
            config,
        )
    }

    pub fn with_tables(
        prices: LocationPriceTable,
        base_costs: CategoryBaseCost,
        config: TrainingConfig,
    ) -> Self {
        Self {
            entries: Category::ALL
                .iter()
                .map(|c| Mutex::new(ModelEntry::new(*c, config.rng_for(*c))))
                .collect(),
            prices,
            base_costs,
            config,
            extractor: FeatureExtractor::new(),
            formatter: OutputFormatter::new(),
            metrics: EstimatorMetrics::new(),
            logger: StructuredLogger::new("estimator"),
            trained_count: AtomicUsize::new(0),
        }
    }

    pub fn with_output_config(mut self, config: OutputConfig) -> Self {
        self.formatter = OutputFormatter::with_config(config);
        self
    }

    pub fn with_metrics(mut self, metrics: EstimatorMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn prices(&self) -> &LocationPriceTable {
        &self.prices
    }

    pub fn base_costs(&self) -> &CategoryBaseCost {
        &self.base_costs
    }

    pub fn metrics(&self) -> &EstimatorMetrics {
        &self.metrics
    }

    fn lock(&self, category: Category) -> Result<MutexGuard<'_, ModelEntry>> {
        self.entries[category.index()]
            .lock()
            .map_err(|_| EstimatorError::LockPoisoned { category })
    }

    /// Snapshot of one category's entry
    pub fn entry(&self, category: Category) -> Result<ModelEntry> {
        Ok(self.lock(category)?.clone())
    }

    pub fn is_trained(&self, category: Category) -> Result<bool> {
        Ok(self.lock(category)?.trained)
    }

    /// Lifecycle state of every category
    pub fn status(&self) -> Vec<ModelStatus> {
        Category::ALL
            .iter()
            .map(|c| match self.lock(*c) {
                Ok(entry) => entry.status(),
                Err(e) => ModelStatus {
                    category: *c,
                    trained: false,
                    trained_at: None,
                    last_error: Some(e.to_string()),
                },
            })
            .collect()
    }

    /// Train a category with the configured batch size
    pub fn train(&self, category: Category, epochs: usize) -> Result<TrainingDiagnostics> {
        self.train_with(category, epochs, self.config.batch_size)
    }

    /// Synthesize a fresh batch and fit the category's model on it
    ///
    /// On failure the entry keeps whatever model it had before and records
    /// the error; other categories are untouched.
    pub fn train_with(
        &self,
        category: Category,
        epochs: usize,
        batch_size: usize,
    ) -> Result<TrainingDiagnostics> {
        let mut entry = self.lock(category)?;
        self.train_locked(&mut entry, epochs, batch_size)
    }

    /// Train lazily if needed, returning the latest fit history
    pub fn ensure_trained(&self, category: Category) -> Result<TrainingDiagnostics> {
        let mut entry = self.lock(category)?;
        self.ensure_trained_locked(&mut entry)
    }

    fn ensure_trained_locked(&self, entry: &mut ModelEntry) -> Result<TrainingDiagnostics> {
        if entry.trained {
            if let Some(diagnostics) = &entry.diagnostics {
                return Ok(diagnostics.clone());
            }
        }
        debug!(category = %entry.category, "Model untrained, training lazily");
        self.train_locked(entry, self.config.default_epochs, self.config.batch_size)
    }

    fn train_locked(
        &self,
        entry: &mut ModelEntry,
        epochs: usize,
        batch_size: usize,
    ) -> Result<TrainingDiagnostics> {
        let category = entry.category;
        match self.fit_category(category, epochs, batch_size, &mut entry.rng) {
            Ok((network, input_stats, output_stats, diagnostics)) => {
                if !entry.trained {
                    let count = self.trained_count.fetch_add(1, Ordering::Relaxed) + 1;
                    self.metrics.set_trained_models(count as i64);
                }
                entry.network = Some(network);
                entry.input_stats = input_stats;
                entry.output_stats = output_stats;
                entry.trained = true;
                entry.diagnostics = Some(diagnostics.clone());
                entry.last_error = None;

                self.metrics
                    .observe_training(category, diagnostics.duration_ms as f64 / 1000.0);
                self.logger.log_training(&diagnostics);
                Ok(diagnostics)
            }
            Err(e) => {
                entry.last_error = Some(e.to_string());
                self.metrics.inc_training_failures(category);
                self.logger.log_training_failed(category, &e.to_string());
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn fit_category(
        &self,
        category: Category,
        epochs: usize,
        batch_size: usize,
        rng: &mut StdRng,
    ) -> Result<(
        DenseNetwork,
        ColumnStats<NUM_FEATURES>,
        ColumnStats<NUM_TARGETS>,
        TrainingDiagnostics,
    )> {
        if epochs == 0 {
            return Err(EstimatorError::InvalidInput(
                "epochs must be at least 1".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(EstimatorError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.config.validation_split) {
            return Err(EstimatorError::InvalidInput(format!(
                "validation split must be within [0, 1), got {}",
                self.config.validation_split
            )));
        }

        let start = Instant::now();
        let synthesizer =
            SampleSynthesizer::new(category, self.base_costs.get(category), self.prices.values())?;
        let samples = synthesizer.generate(self.config.sample_count, rng)?;
        let features: Vec<[f64; NUM_FEATURES]> =
            samples.iter().map(|s| s.features.to_array()).collect();
        let targets: Vec<[f64; NUM_TARGETS]> =
            samples.iter().map(|s| s.targets.to_array()).collect();

        let input_stats = ColumnStats::fit(&features, category, ColumnKind::Feature)?;
        let output_stats = ColumnStats::fit(&targets, category, ColumnKind::Target)?;
        let x: Vec<[f64; NUM_FEATURES]> =
            features.iter().map(|f| input_stats.normalize(f)).collect();
        let y: Vec<[f64; NUM_TARGETS]> =
            targets.iter().map(|t| output_stats.normalize(t)).collect();

        let mut network = DenseNetwork::new(
            NUM_FEATURES,
            &self.config.hidden_layers,
            NUM_TARGETS,
            rng,
        );
        let options = FitOptions {
            epochs,
            batch_size,
            validation_split: self.config.validation_split,
            learning_rate: self.config.learning_rate,
        };
        let history = network
            .fit(&x, &y, &options, rng)
            .map_err(|e| match e {
                FitError::Diverged { epoch, loss } => EstimatorError::TrainingDiverged {
                    category,
                    epoch,
                    loss,
                },
                FitError::EmptyTrainingSet => EstimatorError::InvalidInput(format!(
                    "{} samples leave no training split",
                    self.config.sample_count
                )),
                FitError::ShapeMismatch { expected, found } => EstimatorError::InvalidInput(
                    format!("expected {} columns, found {}", expected, found),
                ),
            })?;

        let diagnostics = TrainingDiagnostics {
            category,
            epochs,
            batch_size,
            train_samples: history.train_samples,
            validation_samples: history.validation_samples,
            train_loss: history.train_loss,
            train_mae: history.train_mae,
            val_loss: history.val_loss,
            val_mae: history.val_mae,
            duration_ms: start.elapsed().as_millis() as u64,
            trained_at: chrono::Utc::now().timestamp(),
        };
        Ok((network, input_stats, output_stats, diagnostics))
    }

    /// Estimate the financial outcome of a project
    pub fn predict(&self, input: &ProjectInput) -> Result<PredictionResult> {
        let start = Instant::now();
        let features = self.extractor.extract(input, &self.prices)?;
        let category = input.category;

        let targets = {
            let mut entry = self.lock(category)?;
            if !entry.trained {
                self.ensure_trained_locked(&mut entry).map_err(|e| {
                    EstimatorError::UntrainedModel {
                        category,
                        reason: e.to_string(),
                    }
                })?;
            }
            entry.infer(&features.to_array())?
        };

        let result = self.formatter.format(
            category,
            features.effective_ratio,
            targets,
            input.market,
        );

        self.metrics
            .observe_prediction(category, start.elapsed().as_secs_f64());
        self.logger.log_prediction(&input.location, &result);
        info!(
            category = %category,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Prediction completed"
        );
        Ok(result)
    }

    /// Positional form of [`ModelRegistry::predict`]
    pub fn predict_project(
        &self,
        category: Category,
        location: &str,
        land_area: f64,
        floors: u32,
        demand_level: f64,
        competition_level: f64,
    ) -> Result<PredictionResult> {
        self.predict(&ProjectInput {
            category,
            location: location.to_string(),
            land_area,
            floors,
            market: MarketConditions {
                demand_level,
                competition_level,
            },
        })
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> TrainingConfig {
        TrainingConfig::default()
            .with_seed(17)
            .with_sample_count(200)
            .with_default_epochs(2)
    }

    fn residential_request() -> ProjectInput {
        ProjectInput {
            category: Category::Residential,
            location: "حي النرجس".to_string(),
            land_area: 3500.0,
            floors: 4,
            market: MarketConditions::default(),
        }
    }

    #[test]
    fn test_new_registry_is_untrained() {
        let registry = ModelRegistry::new(quick_config());
        let status = registry.status();
        assert_eq!(status.len(), 8);
        assert!(status.iter().all(|s| !s.trained && s.last_error.is_none()));
    }

    #[test]
    fn test_train_sets_flag_and_stats() {
        let registry = ModelRegistry::new(quick_config());
        let diagnostics = registry.train(Category::Commercial, 2).unwrap();
        assert_eq!(diagnostics.category, Category::Commercial);
        assert_eq!(diagnostics.epochs, 2);
        assert_eq!(diagnostics.train_loss.len(), 2);
        assert_eq!(diagnostics.train_samples, 160);
        assert_eq!(diagnostics.validation_samples, 40);

        let entry = registry.entry(Category::Commercial).unwrap();
        assert!(entry.is_trained());
        assert!(entry.input_stats().std.iter().all(|s| *s > 0.0));
        assert!(entry.output_stats().std.iter().all(|s| *s > 0.0));
    }

    #[test]
    fn test_training_is_isolated_per_category() {
        let registry = ModelRegistry::new(quick_config());
        registry.train(Category::ShoppingMall, 1).unwrap();
        for category in Category::ALL {
            assert_eq!(
                registry.is_trained(category).unwrap(),
                category == Category::ShoppingMall
            );
        }
    }

    #[test]
    fn test_ensure_trained_is_noop_when_trained() {
        let registry = ModelRegistry::new(quick_config());
        let first = registry.ensure_trained(Category::MixedUse).unwrap();
        let second = registry.ensure_trained(Category::MixedUse).unwrap();
        assert_eq!(first.trained_at, second.trained_at);
        assert_eq!(first.train_loss, second.train_loss);
        assert_eq!(registry.metrics().trainings(Category::MixedUse), 1);
    }

    #[test]
    fn test_predict_trains_lazily() {
        let registry = ModelRegistry::new(quick_config());
        assert!(!registry.is_trained(Category::Residential).unwrap());
        let result = registry.predict(&residential_request()).unwrap();
        assert!(registry.is_trained(Category::Residential).unwrap());
        assert!((result.effective_ratio - 0.6375).abs() < 1e-12);
        assert_eq!(registry.metrics().predictions(Category::Residential), 1);
    }

    #[test]
    fn test_predict_is_deterministic_once_trained() {
        let registry = ModelRegistry::new(quick_config());
        let a = registry.predict(&residential_request()).unwrap();
        let b = registry.predict(&residential_request()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.land_cost.to_bits(), b.land_cost.to_bits());
        assert_eq!(a.rental_revenue.to_bits(), b.rental_revenue.to_bits());
    }

    #[test]
    fn test_seeded_training_reproducible() {
        let a = ModelRegistry::new(quick_config());
        let b = ModelRegistry::new(quick_config());
        let da = a.train(Category::SingleVilla, 2).unwrap();
        let db = b.train(Category::SingleVilla, 2).unwrap();
        assert_eq!(da.train_loss, db.train_loss);
        assert_eq!(
            a.predict_project(Category::SingleVilla, "جدة", 1200.0, 2, 1.0, 1.0)
                .unwrap()
                .sales_revenue,
            b.predict_project(Category::SingleVilla, "جدة", 1200.0, 2, 1.0, 1.0)
                .unwrap()
                .sales_revenue
        );
    }

    #[test]
    fn test_seeded_retraining_draws_fresh_data() {
        let registry = ModelRegistry::new(quick_config());
        let first = registry.train(Category::Commercial, 2).unwrap();
        let second = registry.train(Category::Commercial, 2).unwrap();
        assert_ne!(first.train_loss, second.train_loss);
    }

    #[test]
    fn test_seeded_training_sequence_reproducible() {
        let a = ModelRegistry::new(quick_config());
        let b = ModelRegistry::new(quick_config());
        for _ in 0..3 {
            let da = a.train(Category::Commercial, 2).unwrap();
            let db = b.train(Category::Commercial, 2).unwrap();
            assert_eq!(da.train_loss, db.train_loss);
            assert_eq!(da.val_mae, db.val_mae);
        }
    }

    #[test]
    fn test_input_errors_do_not_train() {
        let registry = ModelRegistry::new(quick_config());
        let mut request = residential_request();
        request.location = "unknown".to_string();
        assert!(matches!(
            registry.predict(&request),
            Err(EstimatorError::UnknownLocation(_))
        ));
        request = residential_request();
        request.floors = 1;
        assert!(matches!(
            registry.predict(&request),
            Err(EstimatorError::InvalidInput(_))
        ));
        assert!(!registry.is_trained(Category::Residential).unwrap());
    }

    #[test]
    fn test_failed_training_surfaces_as_untrained_model() {
        // A single sample has zero variance in every column
        let config = quick_config().with_sample_count(1);
        let registry = ModelRegistry::new(config);

        let err = registry.train(Category::AdminBuilding, 1).unwrap_err();
        assert!(matches!(err, EstimatorError::DegenerateNormalization { .. }));

        let err = registry
            .predict_project(Category::AdminBuilding, "الرياض", 2000.0, 3, 1.0, 1.0)
            .unwrap_err();
        match err {
            EstimatorError::UntrainedModel { category, reason } => {
                assert_eq!(category, Category::AdminBuilding);
                assert!(reason.contains("zero standard deviation"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let status = registry.status();
        let admin = &status[Category::AdminBuilding.index()];
        assert!(!admin.trained);
        assert!(admin.last_error.is_some());
        assert!(status
            .iter()
            .filter(|s| s.category != Category::AdminBuilding)
            .all(|s| s.last_error.is_none()));
    }

    #[test]
    fn test_invalid_training_parameters() {
        let registry = ModelRegistry::new(quick_config());
        assert!(matches!(
            registry.train(Category::Residential, 0),
            Err(EstimatorError::InvalidInput(_))
        ));
        assert!(matches!(
            registry.train_with(Category::Residential, 1, 0),
            Err(EstimatorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_custom_output_config() {
        let registry = ModelRegistry::new(quick_config()).with_output_config(OutputConfig {
            design_rate: 0.0,
            ..OutputConfig::default()
        });
        let result = registry.predict(&residential_request()).unwrap();
        assert_eq!(result.overheads.design, 0.0);
    }
}
