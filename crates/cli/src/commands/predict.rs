//! Estimate command

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use estimator_lib::{
    Category, EstimatorError, InvestmentReport, MarketConditions, ProjectInput, TrainingScheduler,
};

use crate::output::{
    color_outlook, color_risk, color_roi, format_area, format_currency, format_percent,
    format_years, print_error, print_info, print_json, print_warning, OutputFormat,
};

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Project category (e.g. residential, shopping_mall)
    #[arg(long, short)]
    pub category: Category,

    /// Location name as listed by `reest locations`
    #[arg(long, short)]
    pub location: String,

    /// Land area in square metres
    #[arg(long, short = 'a')]
    pub land_area: f64,

    /// Number of floors (at least 2)
    #[arg(long, short)]
    pub floors: u32,

    /// Demand level in [0.8, 1.2]
    #[arg(long, default_value_t = 1.0)]
    pub demand: f64,

    /// Competition level in [0.8, 1.2]
    #[arg(long, default_value_t = 1.0)]
    pub competition: f64,

    /// Train with this many epochs first instead of the configured default
    #[arg(long, short)]
    pub epochs: Option<usize>,
}

impl PredictArgs {
    fn input(&self) -> ProjectInput {
        ProjectInput {
            category: self.category,
            location: self.location.clone(),
            land_area: self.land_area,
            floors: self.floors,
            market: MarketConditions {
                demand_level: self.demand,
                competition_level: self.competition,
            },
        }
    }
}

/// Train if asked, predict and print the investment report
pub async fn run(
    scheduler: &TrainingScheduler,
    args: PredictArgs,
    format: OutputFormat,
) -> Result<()> {
    let registry = scheduler.registry();

    if let Some(epochs) = args.epochs {
        let outcome = scheduler
            .train(args.category, epochs, registry.config().batch_size)
            .await;
        if let Some(error) = outcome.error {
            bail!("Training {} failed: {}", args.category, error);
        }
    }

    let input = args.input();
    let result = match scheduler.predict(input.clone()).await {
        Ok(result) => result,
        Err(e @ EstimatorError::UnknownLocation(_)) => {
            let known: Vec<&str> = registry.prices().locations().map(|(name, _)| name).collect();
            print_error(&format!("Known locations: {}", known.join("، ")));
            return Err(e.into());
        }
        Err(e) => return Err(e).context("Prediction failed"),
    };

    let report = InvestmentReport::new(&input, &result);
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &InvestmentReport) {
    println!("{}", "Investment Report".bold());
    println!("{}", "=".repeat(50));
    println!(
        "Category:               {} ({})",
        report.project.category.to_string().cyan(),
        report.project.category_label
    );
    println!("Location:               {}", report.project.location.cyan());
    println!("Land area:              {}", format_area(report.project.land_area));
    println!("Floors:                 {}", report.project.floors);
    println!("Effective ratio:        {:.4}", report.project.effective_ratio);
    println!();

    let costs = &report.costs;
    println!("{}", "Project Costs".bold());
    println!("{}", "-".repeat(50));
    println!("Land:                   {}", format_currency(costs.land_cost));
    println!("Construction:           {}", format_currency(costs.construction_cost));
    println!("Design:                 {}", format_currency(costs.overheads.design));
    println!("Licensing:              {}", format_currency(costs.overheads.licensing));
    println!("Management:             {}", format_currency(costs.overheads.management));
    println!(
        "{}                  {}",
        "Total:".bold(),
        format_currency(costs.total_cost).bold()
    );
    println!();

    let revenue = &report.revenue;
    println!("{}", "Expected Revenue".bold());
    println!("{}", "-".repeat(50));
    println!("Sales:                  {}", format_currency(revenue.sales_revenue).green());
    println!("Annual rent:            {}", format_currency(revenue.annual_rental_revenue));
    println!("Annual yield:           {}", format_percent(revenue.annual_rental_yield));
    println!();

    let market = &report.market;
    println!("{}", "Market Analysis".bold());
    println!("{}", "-".repeat(50));
    println!(
        "Demand:                 {} ({})",
        market.demand.as_str(),
        market.demand.label_ar()
    );
    println!(
        "Competition:            {} ({})",
        market.competition.as_str(),
        market.competition.label_ar()
    );
    println!("Growth:                 {}", market.growth);
    println!("Outlook:                {}", color_outlook(market.outlook));
    println!();

    let performance = &report.performance;
    println!("{}", "Performance".bold());
    println!("{}", "-".repeat(50));
    println!("ROI:                    {}", color_roi(performance.roi));
    println!("Payback period:         {}", format_years(performance.payback_years));
    println!("Annual growth:          {}", performance.annual_growth);
    println!("Risk:                   {}", color_risk(performance.risk));

    if let Some(mall) = &report.mall_details {
        println!();
        println!("{}", "Mall Details".bold());
        println!("{}", "-".repeat(50));
        println!("Shops:                  {}", mall.shop_count);
        println!("Leasable area:          {}", format_area(mall.leasable_area));
        println!("Parking spaces:         {}", mall.parking_spaces);
        println!("Amenities:              {}", mall.amenities.join("، "));
    }

    println!();
    if performance.payback_years.is_none() {
        print_warning("Projected rent never recovers the investment");
    }
    print_info(&format!(
        "Generated {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
}
