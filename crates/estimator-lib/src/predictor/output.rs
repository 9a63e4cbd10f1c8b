//! Prediction output post-processing
//!
//! Turns the four denormalised model outputs into a [`PredictionResult`]
//! with overheads, ROI, payback period and the market/risk classifications.

use crate::models::{
    Category, FinancialTargets, MarketConditions, MarketOutlook, Overheads, PredictionResult,
    RiskTier,
};
use serde::{Deserialize, Serialize};

/// Design overhead as a fraction of total cost
pub const DESIGN_RATE: f64 = 0.03;

/// Licensing overhead as a fraction of total cost
pub const LICENSING_RATE: f64 = 0.02;

/// Management overhead as a fraction of total cost
pub const MANAGEMENT_RATE: f64 = 0.05;

/// Rates and classification thresholds for derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub design_rate: f64,
    pub licensing_rate: f64,
    pub management_rate: f64,
    /// Outlook score strictly above this is excellent
    pub excellent_outlook_score: f64,
    /// Outlook score strictly above this (and not excellent) is good
    pub good_outlook_score: f64,
    /// The low-risk ROI floor is inclusive; the medium floor and payback ceilings are strict
    pub low_risk_min_roi: f64,
    pub low_risk_max_payback: f64,
    pub medium_risk_min_roi: f64,
    pub medium_risk_max_payback: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            design_rate: DESIGN_RATE,
            licensing_rate: LICENSING_RATE,
            management_rate: MANAGEMENT_RATE,
            excellent_outlook_score: 1.2,
            good_outlook_score: 1.0,
            low_risk_min_roi: 25.0,
            low_risk_max_payback: 5.0,
            medium_risk_min_roi: 15.0,
            medium_risk_max_payback: 8.0,
        }
    }
}

/// Derives secondary financial indicators from raw model outputs
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    config: OutputConfig,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self {
            config: OutputConfig::default(),
        }
    }

    pub fn with_config(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Build the full prediction result from denormalised outputs
    pub fn format(
        &self,
        category: Category,
        effective_ratio: f64,
        targets: FinancialTargets,
        market: MarketConditions,
    ) -> PredictionResult {
        let total_cost = targets.land_cost + targets.construction_cost;
        let roi = (targets.sales_revenue / total_cost - 1.0) * 100.0;
        let payback_period = payback_period(total_cost, targets.rental_revenue);

        PredictionResult {
            category,
            effective_ratio,
            land_cost: targets.land_cost,
            construction_cost: targets.construction_cost,
            sales_revenue: targets.sales_revenue,
            rental_revenue: targets.rental_revenue,
            total_cost,
            overheads: self.overheads(total_cost),
            roi,
            payback_period,
            market_outlook: self.market_outlook(market.demand_level, market.competition_level),
            risk_tier: self.risk_tier(roi, payback_period),
        }
    }

    pub fn overheads(&self, total_cost: f64) -> Overheads {
        Overheads {
            design: total_cost * self.config.design_rate,
            licensing: total_cost * self.config.licensing_rate,
            management: total_cost * self.config.management_rate,
        }
    }

    pub fn market_outlook(&self, demand: f64, competition: f64) -> MarketOutlook {
        let score = outlook_score(demand, competition);
        if score > self.config.excellent_outlook_score {
            MarketOutlook::Excellent
        } else if score > self.config.good_outlook_score {
            MarketOutlook::Good
        } else {
            MarketOutlook::Average
        }
    }

    pub fn risk_tier(&self, roi: f64, payback_period: f64) -> RiskTier {
        if roi >= self.config.low_risk_min_roi
            && payback_period < self.config.low_risk_max_payback
        {
            RiskTier::Low
        } else if roi > self.config.medium_risk_min_roi
            && payback_period < self.config.medium_risk_max_payback
        {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }
}

/// `demand × (2 − competition)`
pub fn outlook_score(demand: f64, competition: f64) -> f64 {
    demand * (2.0 - competition)
}

/// Years to recover total cost from rental revenue, infinite when rent is not positive
pub fn payback_period(total_cost: f64, rental_revenue: f64) -> f64 {
    if rental_revenue > 0.0 {
        total_cost / rental_revenue
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(land: f64, construction: f64, sales: f64, rental: f64) -> FinancialTargets {
        FinancialTargets {
            land_cost: land,
            construction_cost: construction,
            sales_revenue: sales,
            rental_revenue: rental,
        }
    }

    #[test]
    fn test_derived_metrics() {
        let formatter = OutputFormatter::new();
        let result = formatter.format(
            Category::Residential,
            0.6375,
            targets(40.0, 60.0, 130.0, 10.0),
            MarketConditions::default(),
        );
        assert_eq!(result.total_cost, 100.0);
        assert!((result.overheads.design - 3.0).abs() < 1e-12);
        assert!((result.overheads.licensing - 2.0).abs() < 1e-12);
        assert!((result.overheads.management - 5.0).abs() < 1e-12);
        assert!((result.roi - 30.0).abs() < 1e-9);
        assert!((result.payback_period - 10.0).abs() < 1e-12);
        assert_eq!(result.market_outlook, MarketOutlook::Average);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_zero_rental_gives_infinite_payback() {
        let formatter = OutputFormatter::new();
        let result = formatter.format(
            Category::Commercial,
            0.5,
            targets(50.0, 50.0, 150.0, 0.0),
            MarketConditions::default(),
        );
        assert!(result.payback_period.is_infinite());
        assert!(!result.pays_back());
        assert_eq!(result.risk_tier, RiskTier::High);
        assert_eq!(payback_period(100.0, -3.0), f64::INFINITY);
    }

    #[test]
    fn test_risk_tier_boundaries() {
        let formatter = OutputFormatter::new();
        assert_eq!(formatter.risk_tier(25.0, 4.99), RiskTier::Low);
        assert_ne!(formatter.risk_tier(25.0, 5.01), RiskTier::Low);
        assert_eq!(formatter.risk_tier(25.0, 5.01), RiskTier::Medium);
        assert_eq!(formatter.risk_tier(24.99, 4.0), RiskTier::Medium);
        assert_eq!(formatter.risk_tier(14.99, 4.0), RiskTier::High);
        assert_eq!(formatter.risk_tier(15.0, 7.0), RiskTier::High);
        assert_eq!(formatter.risk_tier(15.01, 7.0), RiskTier::Medium);
        assert_eq!(formatter.risk_tier(20.0, 8.0), RiskTier::High);
        assert_eq!(formatter.risk_tier(40.0, f64::INFINITY), RiskTier::High);
    }

    #[test]
    fn test_market_outlook_thresholds() {
        let formatter = OutputFormatter::new();
        assert_eq!(formatter.market_outlook(1.2, 0.8), MarketOutlook::Excellent);
        assert_eq!(formatter.market_outlook(1.1, 0.95), MarketOutlook::Good);
        assert_eq!(formatter.market_outlook(1.0, 1.0), MarketOutlook::Average);
        // score exactly 1.2 is good, not excellent
        assert_eq!(formatter.market_outlook(1.2, 1.0), MarketOutlook::Good);
    }

    #[test]
    fn test_custom_rates() {
        let formatter = OutputFormatter::with_config(OutputConfig {
            design_rate: 0.1,
            ..OutputConfig::default()
        });
        assert!((formatter.overheads(200.0).design - 20.0).abs() < 1e-12);
        assert_eq!(formatter.config().licensing_rate, LICENSING_RATE);
    }
}
