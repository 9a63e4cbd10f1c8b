//! Category and location listings

use anyhow::Result;
use estimator_lib::{Category, ModelRegistry};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{format_currency, print_table, OutputFormat};

#[derive(Tabled, Serialize)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Base Cost / m²")]
    base_cost: String,
    #[tabled(rename = "Sales ×")]
    sales_multiplier: f64,
    #[tabled(rename = "Rent ×")]
    rental_multiplier: f64,
}

#[derive(Tabled, Serialize)]
struct LocationRow {
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Price / m²")]
    price: String,
}

/// List project categories with their construction base cost
pub fn list_categories(registry: &ModelRegistry, format: OutputFormat) -> Result<()> {
    let rows: Vec<CategoryRow> = Category::ALL
        .iter()
        .map(|category| {
            let (sales, rent) = category.revenue_multipliers();
            CategoryRow {
                category: category.slug().to_string(),
                label: category.label_ar().to_string(),
                base_cost: format_currency(registry.base_costs().get(*category)),
                sales_multiplier: sales,
                rental_multiplier: rent,
            }
        })
        .collect();
    print_table(&rows, format);
    Ok(())
}

/// List known locations and their land price
pub fn list_locations(registry: &ModelRegistry, format: OutputFormat) -> Result<()> {
    let rows: Vec<LocationRow> = registry
        .prices()
        .locations()
        .map(|(location, price)| LocationRow {
            location: location.to_string(),
            price: format_currency(price),
        })
        .collect();
    print_table(&rows, format);
    Ok(())
}
