//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use estimator_lib::{MarketOutlook, RiskTier};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Currency suffix used for every amount
pub const CURRENCY: &str = "ريال";

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Print any serialisable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to serialize output: {}", e)),
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Group the integer part of a rounded amount in thousands
fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Format an amount as whole riyals with thousands separators
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{} {}", amount, CURRENCY);
    }
    format!("{} {}", group_thousands(amount), CURRENCY)
}

/// Format an area in square metres
pub fn format_area(square_metres: f64) -> String {
    format!("{} m²", group_thousands(square_metres))
}

/// Format a percentage with one decimal
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format a payback period, `None` meaning it never pays back
pub fn format_years(years: Option<f64>) -> String {
    match years {
        Some(years) => format!("{:.1} years", years),
        None => "never".to_string(),
    }
}

/// Color risk tier
pub fn color_risk(risk: RiskTier) -> String {
    let label = format!("{} ({})", risk.as_str(), risk.label_ar());
    match risk {
        RiskTier::Low => label.green().to_string(),
        RiskTier::Medium => label.yellow().to_string(),
        RiskTier::High => label.red().to_string(),
    }
}

/// Color market outlook
pub fn color_outlook(outlook: MarketOutlook) -> String {
    let label = format!("{} ({})", outlook.as_str(), outlook.label_ar());
    match outlook {
        MarketOutlook::Excellent => label.green().to_string(),
        MarketOutlook::Good => label.cyan().to_string(),
        MarketOutlook::Average => label.yellow().to_string(),
    }
}

/// Color ROI against the risk thresholds
pub fn color_roi(roi: f64) -> String {
    let formatted = format_percent(roi);
    if roi >= 25.0 {
        formatted.green().to_string()
    } else if roi > 15.0 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "trained" | "ok" => status.green().to_string(),
        "untrained" => status.yellow().to_string(),
        "failed" | "error" => status.red().to_string(),
        _ => status.to_string(),
    }
}
