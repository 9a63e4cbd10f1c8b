//! Synthetic training data for the category models
//!
//! Each sample draws a random project from the training domain and
//! derives its financial targets from deterministic baselines perturbed by
//! multiplicative Gaussian noise.

use super::features::{
    effective_ratio, MARKET_LEVEL_RANGE, TRAINING_FLOOR_RANGE, TRAINING_LAND_AREA_RANGE,
};
use crate::error::{EstimatorError, Result};
use crate::models::{Category, FeatureVector, FinancialTargets, TrainingSample};
use rand::seq::SliceRandom;
use rand::Rng;

/// Default number of samples generated per training run
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

/// Standard deviation of the multiplicative noise on every target
pub const NOISE_STD: f64 = 0.1;

/// Generates (feature, target) batches for one category
#[derive(Debug, Clone)]
pub struct SampleSynthesizer {
    category: Category,
    base_cost: f64,
    location_prices: Vec<f64>,
    noise_std: f64,
}

impl SampleSynthesizer {
    pub fn new(category: Category, base_cost: f64, location_prices: Vec<f64>) -> Result<Self> {
        if location_prices.is_empty() {
            return Err(EstimatorError::InvalidInput(
                "cannot synthesize samples without location prices".to_string(),
            ));
        }
        Ok(Self {
            category,
            base_cost,
            location_prices,
            noise_std: NOISE_STD,
        })
    }

    pub fn with_noise_std(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Generate `count` samples from the given random source
    pub fn generate<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<TrainingSample>> {
        (0..count).map(|_| self.sample(rng)).collect()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TrainingSample> {
        let location_price = *self
            .location_prices
            .choose(rng)
            .ok_or_else(|| EstimatorError::InvalidInput("empty location price pool".to_string()))?;
        let land_area = rng.gen_range(TRAINING_LAND_AREA_RANGE.0..=TRAINING_LAND_AREA_RANGE.1);
        let floors = rng.gen_range(TRAINING_FLOOR_RANGE.0..=TRAINING_FLOOR_RANGE.1);
        let ratio = effective_ratio(floors)?;
        let demand = rng.gen_range(MARKET_LEVEL_RANGE.0..=MARKET_LEVEL_RANGE.1);
        let competition = rng.gen_range(MARKET_LEVEL_RANGE.0..=MARKET_LEVEL_RANGE.1);

        let buildable_area = land_area * ratio * floors as f64;
        let land_cost = location_price * land_area * self.noise(rng);
        let construction_cost = self.base_cost * buildable_area * self.noise(rng);

        let total_cost = land_cost + construction_cost;
        let (sales_multiplier, rental_multiplier) = self.category.revenue_multipliers();
        let sales_revenue =
            total_cost * sales_multiplier * demand * (2.0 - competition) * self.noise(rng);
        let rental_revenue = total_cost * rental_multiplier * demand * self.noise(rng);

        Ok(TrainingSample {
            features: FeatureVector {
                location_price,
                land_area,
                floors: floors as f64,
                effective_ratio: ratio,
                demand_level: demand,
                competition_level: competition,
            },
            targets: FinancialTargets {
                land_cost,
                construction_cost,
                sales_revenue,
                rental_revenue,
            },
        })
    }

    /// `1 + N(0, noise_std)`
    fn noise<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        1.0 + self.noise_std * standard_normal(rng)
    }
}

/// Box-Muller draw from N(0, 1)
pub(crate) fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
