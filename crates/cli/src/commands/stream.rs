//! Stream replay: the server-side sample and the client-driven watch loop

use anyhow::{Context, Result};
use colored::Colorize;
use server_lib::stream::{Dataset, DatasetRow};
use server_lib::FeatureVector;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;
use tabled::{builder::Builder, settings::Style};

use crate::client::ApiClient;
use crate::output::{
    color_grade, format_feature, format_proba, print_error, print_json, print_success,
    print_warning, OutputFormat,
};

/// Show the server's replay of the first `n` dataset rows across all models
pub async fn show_sample(client: &ApiClient, n: i64, format: OutputFormat) -> Result<()> {
    let result = client.sample_stream(n).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.items.is_empty() {
                print_warning("Dataset is empty");
                return Ok(());
            }

            let models: BTreeSet<&str> = result
                .items
                .iter()
                .flat_map(|item| item.pred.keys().map(String::as_str))
                .collect();

            let mut builder = Builder::default();
            let mut header: Vec<String> = ["#", "DRC %", "Moisture", "Impurities", "Color"]
                .iter()
                .map(|h| h.to_string())
                .collect();
            header.extend(models.iter().map(|m| m.to_string()));
            builder.push_record(header);

            for (i, item) in result.items.iter().enumerate() {
                let mut record = vec![(i + 1).to_string()];
                record.extend(item.features.values().into_iter().map(format_feature));
                record.extend(models.iter().map(|model| {
                    item.pred
                        .get(*model)
                        .map(|label| color_grade(label))
                        .unwrap_or_else(|| "-".to_string())
                }));
                builder.push_record(record);
            }

            println!("{}", builder.build().with(Style::rounded()));
            println!("\nTotal: {} rows", result.items.len());
        }
    }

    Ok(())
}

/// Position in the local dataset, wrapping to the start after the last row
#[derive(Debug, Clone)]
pub struct Cursor {
    position: usize,
    len: usize,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self { position: 0, len }
    }

    /// Index of the next row to send, or `None` for an empty dataset
    pub fn advance(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let current = self.position;
        self.position = (self.position + 1) % self.len;
        Some(current)
    }
}

/// Running count of predicted labels
#[derive(Debug, Clone, Default)]
pub struct Tally {
    counts: BTreeMap<String, usize>,
    matches: usize,
    labelled: usize,
}

impl Tally {
    pub fn record(&mut self, predicted: &str, expected: Option<&str>) {
        *self.counts.entry(predicted.to_string()).or_default() += 1;
        if let Some(expected) = expected {
            self.labelled += 1;
            if expected == predicted {
                self.matches += 1;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    /// Agreement with the dataset's own grades, when it has any
    pub fn agreement(&self) -> Option<f64> {
        (self.labelled > 0).then(|| self.matches as f64 / self.labelled as f64)
    }
}

/// Settings for the watch loop
pub struct WatchOptions<'a> {
    pub dataset: &'a Path,
    pub model: &'a str,
    pub rows: usize,
    pub interval: Duration,
}

/// Replay the local dataset row by row through `/predict`
///
/// The cursor lives here, not on the server; the loop stops after `rows`
/// predictions or on Ctrl-C and then prints the label tally.
pub async fn watch(client: &ApiClient, options: WatchOptions<'_>, format: OutputFormat) -> Result<()> {
    let rows = Dataset::new(options.dataset)
        .read_all()
        .with_context(|| format!("Failed to load {}", options.dataset.display()))?;
    if rows.is_empty() {
        print_warning("Dataset is empty, nothing to stream");
        return Ok(());
    }

    if let OutputFormat::Table = format {
        println!(
            "{} {} rows from {} with {} every {}ms (Ctrl-C to stop)",
            "Streaming".bold(),
            options.rows,
            options.dataset.display(),
            options.model.cyan(),
            options.interval.as_millis()
        );
    }

    let mut cursor = Cursor::new(rows.len());
    let mut tally = Tally::default();

    for step in 1..=options.rows {
        let Some(index) = cursor.advance() else { break };
        let row = &rows[index];

        match client.predict(&row.features, options.model).await {
            Ok(result) => {
                tally.record(&result.prediction, row.grade.as_deref());
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string(&result)?),
                    OutputFormat::Table => print_step(step, row, &result.prediction, result.proba.as_ref()),
                }
            }
            Err(e) => print_error(&format!("row {}: {:#}", index + 1, e)),
        }

        if step < options.rows {
            tokio::select! {
                _ = tokio::time::sleep(options.interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    print_warning("Interrupted");
                    break;
                }
            }
        }
    }

    print_tally(&tally, format)
}

fn print_step(step: usize, row: &DatasetRow, prediction: &str, proba: Option<&BTreeMap<String, f64>>) {
    println!(
        "{:>4}  {}  {}  {}",
        step,
        describe_features(&row.features),
        color_grade(prediction),
        proba.map(format_proba).unwrap_or_default().dimmed()
    );
}

fn describe_features(features: &FeatureVector) -> String {
    format!(
        "drc={:>6} moisture={:>6} impurities={:>6} color={:>6}",
        format_feature(features.drc_percentage()),
        format_feature(features.moisture_content()),
        format_feature(features.impurities()),
        format_feature(features.color_score())
    )
}

fn print_tally(tally: &Tally, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "total": tally.total(),
            "counts": tally.counts(),
            "agreement": tally.agreement(),
        })),
        OutputFormat::Table => {
            println!();
            print_success(&format!("{} predictions", tally.total()));
            for (label, count) in tally.counts() {
                println!("  {}  {}", color_grade(label), count);
            }
            if let Some(agreement) = tally.agreement() {
                println!("  agreement with dataset grades: {:.1}%", agreement * 100.0);
            }
            Ok(())
        }
    }
}
