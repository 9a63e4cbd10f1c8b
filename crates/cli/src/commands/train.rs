//! Training command

use anyhow::{bail, Result};
use clap::Args;
use estimator_lib::predictor::TrainingOutcome;
use estimator_lib::{Category, TrainingDiagnostics, TrainingScheduler};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{
    color_status, print_error, print_json, print_success, print_table, OutputFormat,
};

#[derive(Debug, Args)]
pub struct TrainArgs {
    /// Train only this category (all categories when omitted)
    #[arg(long, short)]
    pub category: Option<Category>,

    /// Number of epochs (configured default when omitted)
    #[arg(long, short)]
    pub epochs: Option<usize>,

    /// Mini-batch size (configured default when omitted)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Tabled, Serialize)]
struct TrainingRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Epochs")]
    epochs: String,
    #[tabled(rename = "Train Loss")]
    train_loss: String,
    #[tabled(rename = "Val Loss")]
    val_loss: String,
    #[tabled(rename = "Val MAE")]
    val_mae: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Trained At")]
    trained_at: String,
}

#[derive(Serialize)]
struct TrainingReport<'a> {
    category: Category,
    succeeded: bool,
    diagnostics: Option<&'a TrainingDiagnostics>,
    error: Option<&'a str>,
}

fn metric(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

fn row(outcome: &TrainingOutcome) -> TrainingRow {
    match &outcome.diagnostics {
        Some(d) => TrainingRow {
            category: outcome.category.slug().to_string(),
            status: color_status("trained"),
            epochs: d.epochs.to_string(),
            train_loss: metric(d.final_train_loss()),
            val_loss: metric(d.final_val_loss()),
            val_mae: metric(d.final_val_mae()),
            duration: format!("{}ms", d.duration_ms),
            trained_at: chrono::DateTime::from_timestamp(d.trained_at, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        },
        None => TrainingRow {
            category: outcome.category.slug().to_string(),
            status: color_status("failed"),
            epochs: "-".to_string(),
            train_loss: "-".to_string(),
            val_loss: "-".to_string(),
            val_mae: "-".to_string(),
            duration: format!("{}ms", outcome.duration_us / 1000),
            trained_at: "-".to_string(),
        },
    }
}

/// Train one or every category and print the fit diagnostics
pub async fn run(
    scheduler: &TrainingScheduler,
    args: TrainArgs,
    format: OutputFormat,
) -> Result<()> {
    let config = scheduler.registry().config();
    let epochs = args.epochs.unwrap_or(config.default_epochs);
    let batch_size = args.batch_size.unwrap_or(config.batch_size);
    let categories: Vec<Category> = match args.category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };

    let outcomes = scheduler.train_all(&categories, epochs, batch_size).await;

    match format {
        OutputFormat::Json => {
            let reports: Vec<TrainingReport<'_>> = outcomes
                .iter()
                .map(|o| TrainingReport {
                    category: o.category,
                    succeeded: o.succeeded(),
                    diagnostics: o.diagnostics.as_ref(),
                    error: o.error.as_deref(),
                })
                .collect();
            print_json(&reports);
        }
        OutputFormat::Table => {
            let rows: Vec<TrainingRow> = outcomes.iter().map(row).collect();
            print_table(&rows, format);
            for outcome in outcomes.iter().filter(|o| !o.succeeded()) {
                if let Some(error) = &outcome.error {
                    print_error(&format!("{}: {}", outcome.category, error));
                }
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    if failed > 0 {
        bail!("{} of {} trainings failed", failed, outcomes.len());
    }
    if matches!(format, OutputFormat::Table) {
        print_success(&format!("Trained {} categories", outcomes.len()));
    }
    Ok(())
}
