//! Investment report assembly
//!
//! Combines a [`PredictionResult`] with the request that produced it into a
//! structured, serialisable report. Values stay numeric; presentation
//! (currency, percentages, colours) is left to the caller.

use crate::models::{
    Category, MarketConditions, MarketOutlook, Overheads, PredictionResult, ProjectInput, RiskTier,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Share of gross floor area that is leasable in a shopping mall
pub const MALL_LEASABLE_FRACTION: f64 = 0.7;

/// Average shop size in square metres
pub const MALL_SHOP_AREA: f64 = 100.0;

/// Parking spaces per square metre of land
pub const MALL_PARKING_PER_M2: f64 = 0.4;

/// Market growth assumption carried by every report
pub const MARKET_GROWTH: &str = "stable";

/// Annual growth range carried by every report
pub const ANNUAL_GROWTH_RANGE: &str = "8-12%";

const MALL_AMENITIES: [&str; 4] = [
    "مصاعد",
    "سلالم كهربائية",
    "نظام تكييف مركزي",
    "نظام أمن ومراقبة",
];

/// Qualitative level of demand or competition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketLevel {
    Low,
    Medium,
    High,
}

impl MarketLevel {
    /// High when demand is above neutral, medium otherwise
    pub fn for_demand(demand: f64) -> Self {
        if demand > 1.0 {
            MarketLevel::High
        } else {
            MarketLevel::Medium
        }
    }

    /// Low when competition is below neutral, medium otherwise
    pub fn for_competition(competition: f64) -> Self {
        if competition < 1.0 {
            MarketLevel::Low
        } else {
            MarketLevel::Medium
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarketLevel::Low => "low",
            MarketLevel::Medium => "medium",
            MarketLevel::High => "high",
        }
    }

    pub fn label_ar(self) -> &'static str {
        match self {
            MarketLevel::Low => "منخفض",
            MarketLevel::Medium => "متوسط",
            MarketLevel::High => "مرتفع",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub category: Category,
    pub category_label: String,
    pub location: String,
    pub land_area: f64,
    pub floors: u32,
    pub effective_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub land_cost: f64,
    pub construction_cost: f64,
    pub overheads: Overheads,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueForecast {
    pub sales_revenue: f64,
    pub annual_rental_revenue: f64,
    /// Annual rent as a percentage of total cost
    pub annual_rental_yield: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub demand: MarketLevel,
    pub competition: MarketLevel,
    pub growth: String,
    pub outlook: MarketOutlook,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceIndicators {
    pub roi: f64,
    /// `None` when rental revenue never recovers the investment
    pub payback_years: Option<f64>,
    pub annual_growth: String,
    pub risk: RiskTier,
}

/// Extra details reported for shopping malls only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MallDetails {
    pub shop_count: u64,
    pub leasable_area: f64,
    pub parking_spaces: u64,
    pub amenities: Vec<String>,
}

impl MallDetails {
    pub fn new(land_area: f64, floors: u32) -> Self {
        let gross = land_area * floors as f64;
        let leasable_area = gross * MALL_LEASABLE_FRACTION;
        Self {
            shop_count: (leasable_area / MALL_SHOP_AREA).floor() as u64,
            leasable_area,
            parking_spaces: (land_area * MALL_PARKING_PER_M2).floor() as u64,
            amenities: MALL_AMENITIES.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Full investment analysis for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentReport {
    pub project: ProjectDetails,
    pub costs: CostBreakdown,
    pub revenue: RevenueForecast,
    pub market: MarketAnalysis,
    pub performance: PerformanceIndicators,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mall_details: Option<MallDetails>,
    pub generated_at: DateTime<Utc>,
}

impl InvestmentReport {
    pub fn new(input: &ProjectInput, result: &PredictionResult) -> Self {
        Self::generated_at(input, result, Utc::now())
    }

    pub fn generated_at(
        input: &ProjectInput,
        result: &PredictionResult,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let MarketConditions {
            demand_level,
            competition_level,
        } = input.market;

        let mall_details = match result.category {
            Category::ShoppingMall => Some(MallDetails::new(input.land_area, input.floors)),
            _ => None,
        };

        Self {
            project: ProjectDetails {
                category: result.category,
                category_label: result.category.label_ar().to_string(),
                location: input.location.clone(),
                land_area: input.land_area,
                floors: input.floors,
                effective_ratio: result.effective_ratio,
            },
            costs: CostBreakdown {
                land_cost: result.land_cost,
                construction_cost: result.construction_cost,
                overheads: result.overheads,
                total_cost: result.total_cost,
            },
            revenue: RevenueForecast {
                sales_revenue: result.sales_revenue,
                annual_rental_revenue: result.rental_revenue,
                annual_rental_yield: result.rental_revenue / result.total_cost * 100.0,
            },
            market: MarketAnalysis {
                demand: MarketLevel::for_demand(demand_level),
                competition: MarketLevel::for_competition(competition_level),
                growth: MARKET_GROWTH.to_string(),
                outlook: result.market_outlook,
            },
            performance: PerformanceIndicators {
                roi: result.roi,
                payback_years: result.pays_back().then_some(result.payback_period),
                annual_growth: ANNUAL_GROWTH_RANGE.to_string(),
                risk: result.risk_tier,
            },
            mall_details,
            generated_at,
        }
    }
}
