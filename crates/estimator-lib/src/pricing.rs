//! Static price tables consumed by training and inference
//!
//! Both tables are read-only once a registry has been built from them.

use crate::error::{EstimatorError, Result};
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base land price per square metre for each known location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPriceTable {
    prices: BTreeMap<String, f64>,
}

impl LocationPriceTable {
    /// Build a table from arbitrary entries, rejecting non-positive prices
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut prices = BTreeMap::new();
        for (name, price) in entries {
            let name = name.into();
            if !(price.is_finite() && price > 0.0) {
                return Err(EstimatorError::InvalidInput(format!(
                    "location '{}' has non-positive price {}",
                    name, price
                )));
            }
            prices.insert(name, price);
        }
        if prices.is_empty() {
            return Err(EstimatorError::InvalidInput(
                "location price table is empty".to_string(),
            ));
        }
        Ok(Self { prices })
    }

    /// Strict lookup: unknown locations are an error, never a default price
    pub fn price(&self, location: &str) -> Result<f64> {
        self.prices
            .get(location)
            .copied()
            .ok_or_else(|| EstimatorError::UnknownLocation(location.to_string()))
    }

    /// Return a copy with additional or overridden entries
    pub fn extended<I, S>(&self, extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let merged: Vec<(String, f64)> = self
            .prices
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .chain(extra.into_iter().map(|(k, v)| (k.into(), v)))
            .collect();
        Self::new(merged)
    }

    pub fn locations(&self) -> impl Iterator<Item = (&str, f64)> {
        self.prices.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Price values used as the sampling pool for synthetic data
    pub fn values(&self) -> Vec<f64> {
        self.prices.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for LocationPriceTable {
    fn default() -> Self {
        let prices = [
            ("حي النرجس", 5700.0),
            ("حي الملقا", 8334.0),
            ("حي الياسمين", 6995.0),
            ("الرياض", 3000.0),
            ("جدة", 2800.0),
            ("الدمام", 2500.0),
            ("مكة", 3500.0),
            ("المدينة", 2600.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self { prices }
    }
}

/// Construction cost per square metre of buildable area, by category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBaseCost {
    costs: [f64; 8],
}

impl CategoryBaseCost {
    pub fn get(&self, category: Category) -> f64 {
        self.costs[category.index()]
    }

    /// Override one category's base cost
    pub fn with_cost(mut self, category: Category, cost: f64) -> Result<Self> {
        if !(cost.is_finite() && cost > 0.0) {
            return Err(EstimatorError::InvalidInput(format!(
                "base cost for {} must be positive, got {}",
                category, cost
            )));
        }
        self.costs[category.index()] = cost;
        Ok(self)
    }
}

impl Default for CategoryBaseCost {
    fn default() -> Self {
        let mut costs = [0.0; 8];
        for category in Category::ALL {
            costs[category.index()] = match category {
                Category::ShoppingMall => 3500.0,
                Category::Residential => 2800.0,
                Category::Commercial => 3200.0,
                Category::MixedUse => 3300.0,
                Category::VillaCompound => 2600.0,
                Category::SingleVilla => 2500.0,
                Category::ResidentialCompound => 2900.0,
                Category::AdminBuilding => 3000.0,
            };
        }
        Self { costs }
    }
}
