//! Feature extraction for category model inference
//!
//! Turns a live project request into the six-scalar feature vector the
//! category models are trained on. The floor-tiered area ratios computed
//! here are shared with the training sample synthesizer, so both sides of
//! the model always see the same effective ratio for a given floor count.

use crate::error::{EstimatorError, Result};
use crate::models::{AreaRatios, FeatureVector, ProjectInput};
use crate::pricing::LocationPriceTable;
use tracing::warn;

/// Floor count above which the high-rise ratio tier applies
pub const LOW_RISE_MAX_FLOORS: u32 = 4;

/// Smallest floor count accepted for a live estimate
pub const MIN_PREDICTION_FLOORS: u32 = 2;

/// Accepted range for demand and competition levels
pub const MARKET_LEVEL_RANGE: (f64, f64) = (0.8, 1.2);

/// Land area range covered by the synthetic training data
pub const TRAINING_LAND_AREA_RANGE: (f64, f64) = (100.0, 50_000.0);

/// Floor range covered by the synthetic training data
pub const TRAINING_FLOOR_RANGE: (u32, u32) = (1, 10);

/// Buildable-area ratios for a floor count
pub fn area_ratios(floors: u32) -> AreaRatios {
    if floors > LOW_RISE_MAX_FLOORS {
        AreaRatios {
            ground_floor_ratio: 0.35,
            repeated_floor_ratio: 0.45,
            top_floor_ratio: 0.70,
        }
    } else {
        AreaRatios {
            ground_floor_ratio: 0.65,
            repeated_floor_ratio: 0.75,
            top_floor_ratio: 0.70,
        }
    }
}

/// Collapse the tiered ratios into a single per-floor multiplier
///
/// `(ground + repeated × (floors − 2) + top) / floors`
pub fn effective_ratio(floors: u32) -> Result<f64> {
    if floors == 0 {
        return Err(EstimatorError::InvalidInput(
            "floor count must be at least 1".to_string(),
        ));
    }
    let ratios = area_ratios(floors);
    let n = floors as f64;
    let gross = ratios.ground_floor_ratio
        + ratios.repeated_floor_ratio * (n - 2.0)
        + ratios.top_floor_ratio;
    let ratio = gross / n;
    if ratio <= 0.0 {
        return Err(EstimatorError::InvalidInput(format!(
            "floor count {} yields non-positive effective ratio {}",
            floors, ratio
        )));
    }
    Ok(ratio)
}

/// Builds validated feature vectors from live requests
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    min_floors: u32,
    market_range: (f64, f64),
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            min_floors: MIN_PREDICTION_FLOORS,
            market_range: MARKET_LEVEL_RANGE,
        }
    }

    /// Reject requests the pipeline cannot estimate
    pub fn validate(&self, input: &ProjectInput) -> Result<()> {
        if !(input.land_area.is_finite() && input.land_area > 0.0) {
            return Err(EstimatorError::InvalidInput(format!(
                "land area must be positive, got {}",
                input.land_area
            )));
        }
        if input.floors < self.min_floors {
            return Err(EstimatorError::InvalidInput(format!(
                "floor count must be at least {}, got {}",
                self.min_floors, input.floors
            )));
        }
        let (lo, hi) = self.market_range;
        let levels = [
            ("demand level", input.market.demand_level),
            ("competition level", input.market.competition_level),
        ];
        for (name, value) in levels {
            if !(lo..=hi).contains(&value) {
                return Err(EstimatorError::InvalidInput(format!(
                    "{} must be within [{}, {}], got {}",
                    name, lo, hi, value
                )));
            }
        }
        Ok(())
    }

    /// Validate the request and assemble its feature vector
    pub fn extract(
        &self,
        input: &ProjectInput,
        prices: &LocationPriceTable,
    ) -> Result<FeatureVector> {
        self.validate(input)?;
        let location_price = prices.price(&input.location)?;
        let ratio = effective_ratio(input.floors)?;

        if input.land_area > TRAINING_LAND_AREA_RANGE.1 || input.floors > TRAINING_FLOOR_RANGE.1 {
            warn!(
                land_area = input.land_area,
                floors = input.floors,
                "Request lies outside the synthetic training domain"
            );
        }

        Ok(FeatureVector {
            location_price,
            land_area: input.land_area,
            floors: input.floors as f64,
            effective_ratio: ratio,
            demand_level: input.market.demand_level,
            competition_level: input.market.competition_level,
        })
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, MarketConditions};

    fn request(floors: u32, land_area: f64, demand: f64, competition: f64) -> ProjectInput {
        ProjectInput {
            category: Category::Residential,
            location: "حي النرجس".to_string(),
            land_area,
            floors,
            market: MarketConditions {
                demand_level: demand,
                competition_level: competition,
            },
        }
    }

    #[test]
    fn test_ratio_tiers() {
        for floors in 1..=4 {
            let r = area_ratios(floors);
            assert_eq!(
                (r.ground_floor_ratio, r.repeated_floor_ratio, r.top_floor_ratio),
                (0.65, 0.75, 0.70)
            );
        }
        for floors in 5..=30 {
            let r = area_ratios(floors);
            assert_eq!(
                (r.ground_floor_ratio, r.repeated_floor_ratio, r.top_floor_ratio),
                (0.35, 0.45, 0.70)
            );
        }
    }

    #[test]
    fn test_effective_ratio_four_floors() {
        let ratio = effective_ratio(4).unwrap();
        assert!((ratio - 0.6375).abs() < 1e-12, "ratio was {}", ratio);
    }

    #[test]
    fn test_effective_ratio_low_floor_counts() {
        assert!((effective_ratio(1).unwrap() - 0.6).abs() < 1e-12);
        assert!((effective_ratio(2).unwrap() - 0.675).abs() < 1e-12);
        assert!(effective_ratio(0).is_err());
    }

    #[test]
    fn test_extract_scenario() {
        let extractor = FeatureExtractor::new();
        let prices = LocationPriceTable::default();
        let f = extractor.extract(&request(4, 3500.0, 1.0, 1.0), &prices).unwrap();
        assert_eq!(f.location_price, 5700.0);
        assert_eq!(f.land_area, 3500.0);
        assert_eq!(f.floors, 4.0);
        assert!((f.effective_ratio - 0.6375).abs() < 1e-12);
        assert_eq!(f.demand_level, 1.0);
        assert_eq!(f.competition_level, 1.0);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let extractor = FeatureExtractor::new();
        let prices = LocationPriceTable::default();
        let bad = [
            request(4, 0.0, 1.0, 1.0),
            request(4, -5.0, 1.0, 1.0),
            request(4, f64::NAN, 1.0, 1.0),
            request(1, 3500.0, 1.0, 1.0),
            request(4, 3500.0, 0.7, 1.0),
            request(4, 3500.0, 1.0, 1.3),
        ];
        for input in bad {
            let err = extractor.extract(&input, &prices).unwrap_err();
            assert!(matches!(err, EstimatorError::InvalidInput(_)), "{:?}", input);
        }
    }

    #[test]
    fn test_market_bounds_inclusive() {
        let extractor = FeatureExtractor::new();
        assert!(extractor.validate(&request(4, 3500.0, 0.8, 1.2)).is_ok());
        assert!(extractor.validate(&request(4, 3500.0, 1.2, 0.8)).is_ok());
    }

    #[test]
    fn test_unknown_location() {
        let extractor = FeatureExtractor::new();
        let prices = LocationPriceTable::default();
        let mut input = request(4, 3500.0, 1.0, 1.0);
        input.location = "nowhere".to_string();
        assert!(matches!(
            extractor.extract(&input, &prices),
            Err(EstimatorError::UnknownLocation(_))
        ));
    }
}
