//! Core data models for the estimator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of input features fed to every category model
pub const NUM_FEATURES: usize = 6;

/// Number of financial targets produced by every category model
pub const NUM_TARGETS: usize = 4;

/// Project category, used as the registry key everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ShoppingMall,
    Residential,
    Commercial,
    MixedUse,
    VillaCompound,
    SingleVilla,
    ResidentialCompound,
    AdminBuilding,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::ShoppingMall,
        Category::Residential,
        Category::Commercial,
        Category::MixedUse,
        Category::VillaCompound,
        Category::SingleVilla,
        Category::ResidentialCompound,
        Category::AdminBuilding,
    ];

    /// Stable position of the category inside [`Category::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Machine-friendly slug used on the command line and in config files
    pub fn slug(self) -> &'static str {
        match self {
            Category::ShoppingMall => "shopping_mall",
            Category::Residential => "residential",
            Category::Commercial => "commercial",
            Category::MixedUse => "mixed_use",
            Category::VillaCompound => "villa_compound",
            Category::SingleVilla => "single_villa",
            Category::ResidentialCompound => "residential_compound",
            Category::AdminBuilding => "admin_building",
        }
    }

    /// Arabic display label used in generated reports
    pub fn label_ar(self) -> &'static str {
        match self {
            Category::ShoppingMall => "مول تجاري",
            Category::Residential => "سكني",
            Category::Commercial => "تجاري",
            Category::MixedUse => "متعدد الاستخدامات",
            Category::VillaCompound => "فلل سكنية",
            Category::SingleVilla => "فيلا سكنية مفردة",
            Category::ResidentialCompound => "مجمع سكني",
            Category::AdminBuilding => "مبنى إداري",
        }
    }

    /// Sales and rental revenue multipliers applied to total cost
    pub fn revenue_multipliers(self) -> (f64, f64) {
        match self {
            Category::ShoppingMall => (1.4, 0.15),
            _ => (1.3, 0.08),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace('-', "_").to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.slug() == needle || c.label_ar() == s.trim())
            .ok_or_else(|| {
                let known: Vec<_> = Category::ALL.iter().map(|c| c.slug()).collect();
                format!("unknown category '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// Floor-tiered buildable-area ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaRatios {
    pub ground_floor_ratio: f64,
    pub repeated_floor_ratio: f64,
    pub top_floor_ratio: f64,
}

/// Demand and competition multipliers, both expected in [0.8, 1.2]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    pub demand_level: f64,
    pub competition_level: f64,
}

impl Default for MarketConditions {
    fn default() -> Self {
        Self {
            demand_level: 1.0,
            competition_level: 1.0,
        }
    }
}

/// Live estimation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub category: Category,
    pub location: String,
    pub land_area: f64,
    pub floors: u32,
    pub market: MarketConditions,
}

/// Feature vector for category model inference and training
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub location_price: f64,
    pub land_area: f64,
    pub floors: f64,
    pub effective_ratio: f64,
    pub demand_level: f64,
    pub competition_level: f64,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.location_price,
            self.land_area,
            self.floors,
            self.effective_ratio,
            self.demand_level,
            self.competition_level,
        ]
    }
}

/// The four financial quantities every category model predicts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialTargets {
    pub land_cost: f64,
    pub construction_cost: f64,
    pub sales_revenue: f64,
    pub rental_revenue: f64,
}

impl FinancialTargets {
    pub fn to_array(&self) -> [f64; NUM_TARGETS] {
        [
            self.land_cost,
            self.construction_cost,
            self.sales_revenue,
            self.rental_revenue,
        ]
    }

    pub fn from_array(values: [f64; NUM_TARGETS]) -> Self {
        Self {
            land_cost: values[0],
            construction_cost: values[1],
            sales_revenue: values[2],
            rental_revenue: values[3],
        }
    }
}

/// One synthetic (feature, target) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub targets: FinancialTargets,
}

/// Design, licensing and management overheads derived from total cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overheads {
    pub design: f64,
    pub licensing: f64,
    pub management: f64,
}

/// Market outlook classification of `demand × (2 − competition)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketOutlook {
    Average,
    Good,
    Excellent,
}

impl MarketOutlook {
    pub fn as_str(self) -> &'static str {
        match self {
            MarketOutlook::Average => "average",
            MarketOutlook::Good => "good",
            MarketOutlook::Excellent => "excellent",
        }
    }

    pub fn label_ar(self) -> &'static str {
        match self {
            MarketOutlook::Average => "متوسط",
            MarketOutlook::Good => "جيد",
            MarketOutlook::Excellent => "ممتاز",
        }
    }
}

/// Investment risk classification from ROI and payback period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }

    pub fn label_ar(self) -> &'static str {
        match self {
            RiskTier::Low => "منخفض",
            RiskTier::Medium => "متوسط",
            RiskTier::High => "مرتفع",
        }
    }
}

/// Raw model outputs plus derived financial indicators
///
/// `payback_period` is `f64::INFINITY` when rental revenue is not positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub category: Category,
    pub effective_ratio: f64,
    pub land_cost: f64,
    pub construction_cost: f64,
    pub sales_revenue: f64,
    pub rental_revenue: f64,
    pub total_cost: f64,
    pub overheads: Overheads,
    pub roi: f64,
    pub payback_period: f64,
    pub market_outlook: MarketOutlook,
    pub risk_tier: RiskTier,
}

impl PredictionResult {
    pub fn pays_back(&self) -> bool {
        self.payback_period.is_finite()
    }
}

/// Fit history for one category training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDiagnostics {
    pub category: Category,
    pub epochs: usize,
    pub batch_size: usize,
    pub train_samples: usize,
    pub validation_samples: usize,
    pub train_loss: Vec<f64>,
    pub train_mae: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_mae: Vec<f64>,
    pub duration_ms: u64,
    pub trained_at: i64,
}

impl TrainingDiagnostics {
    pub fn final_train_loss(&self) -> Option<f64> {
        self.train_loss.last().copied()
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.val_loss.last().copied()
    }

    pub fn final_val_mae(&self) -> Option<f64> {
        self.val_mae.last().copied()
    }
}

/// Lifecycle snapshot of one registry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub category: Category,
    pub trained: bool,
    pub trained_at: Option<i64>,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_indices_follow_all() {
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("residential".parse::<Category>().unwrap(), Category::Residential);
        assert_eq!("Shopping-Mall".parse::<Category>().unwrap(), Category::ShoppingMall);
        assert_eq!("مبنى إداري".parse::<Category>().unwrap(), Category::AdminBuilding);
        assert!("warehouse".parse::<Category>().is_err());
    }

    #[test]
    fn test_revenue_multipliers() {
        assert_eq!(Category::ShoppingMall.revenue_multipliers(), (1.4, 0.15));
        assert_eq!(Category::Residential.revenue_multipliers(), (1.3, 0.08));
        assert_eq!(Category::AdminBuilding.revenue_multipliers(), (1.3, 0.08));
    }

    #[test]
    fn test_outlook_ordering() {
        assert!(MarketOutlook::Excellent > MarketOutlook::Good);
        assert!(MarketOutlook::Good > MarketOutlook::Average);
    }

    #[test]
    fn test_infinite_payback_serializes() {
        let result = PredictionResult {
            category: Category::Residential,
            effective_ratio: 0.6375,
            land_cost: 1.0,
            construction_cost: 1.0,
            sales_revenue: 3.0,
            rental_revenue: 0.0,
            total_cost: 2.0,
            overheads: Overheads {
                design: 0.06,
                licensing: 0.04,
                management: 0.1,
            },
            roi: 50.0,
            payback_period: f64::INFINITY,
            market_outlook: MarketOutlook::Average,
            risk_tier: RiskTier::High,
        };
        assert!(!result.pays_back());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["payback_period"].is_null());
        assert_eq!(json["risk_tier"], "high");
    }
}
