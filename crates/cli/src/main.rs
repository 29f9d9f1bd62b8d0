//! Polymer Quality Classifier CLI
//!
//! A command-line client for the quality inference service: list models,
//! classify samples, replay the reference dataset and view evaluation metrics.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{metrics, models, predict, stream};
use server_lib::FeatureVector;
use std::path::PathBuf;
use std::time::Duration;

/// Polymer Quality Classifier CLI
#[derive(Parser)]
#[command(name = "qc")]
#[command(author, version, about = "CLI for the Polymer Quality Classifier service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (falls back to ~/.config/qc/config.json, then http://127.0.0.1:8000)
    #[arg(long, env = "QC_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List loaded models and the expected features
    Models,

    /// Classify one latex sample
    Predict {
        /// Dry rubber content, percent
        #[arg(long)]
        drc: f64,

        /// Moisture content, percent
        #[arg(long)]
        moisture: f64,

        /// Impurities, percent
        #[arg(long)]
        impurities: f64,

        /// Color score
        #[arg(long)]
        color: f64,

        /// Model to use (knn, tree, naive_bayes, svm, mlp)
        #[arg(long, short)]
        model: Option<String>,
    },

    /// Replay the first rows of the server's reference dataset through every model
    Sample {
        /// Number of rows
        #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
        n: i64,
    },

    /// Show per-model evaluation metrics
    Metrics,

    /// Stream a local dataset through one model, row by row
    Watch {
        /// Dataset CSV with drcPercentage, moistureContent, impurities and colorScore columns
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Model to use
        #[arg(long, short)]
        model: Option<String>,

        /// Number of predictions before stopping
        #[arg(long, default_value_t = 100)]
        rows: usize,

        /// Delay between predictions
        #[arg(long, default_value_t = 600)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;

    match cli.command {
        Commands::Models => {
            models::show_models(&client, cli.format).await?;
        }
        Commands::Predict {
            drc,
            moisture,
            impurities,
            color,
            model,
        } => {
            let features = FeatureVector::new(drc, moisture, impurities, color)?;
            let model = config.resolve_model(model);
            predict::predict(&client, features, &model, cli.format).await?;
        }
        Commands::Sample { n } => {
            stream::show_sample(&client, n, cli.format).await?;
        }
        Commands::Metrics => {
            metrics::show_metrics(&client, cli.format).await?;
        }
        Commands::Watch {
            dataset,
            model,
            rows,
            interval_ms,
        } => {
            let dataset = dataset
                .or_else(|| config.dataset.clone())
                .context("No dataset given; pass --dataset or set \"dataset\" in the config file")?;
            let model = config.resolve_model(model);
            let options = stream::WatchOptions {
                dataset: &dataset,
                model: &model,
                rows,
                interval: Duration::from_millis(interval_ms),
            };
            stream::watch(&client, options, cli.format).await?;
        }
    }

    Ok(())
}
