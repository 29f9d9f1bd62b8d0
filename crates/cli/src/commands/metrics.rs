//! Evaluation metrics

use anyhow::Result;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_score, format_percent, print_json, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct MetricsRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Precision")]
    precision: String,
    #[tabled(rename = "Recall")]
    recall: String,
    #[tabled(rename = "F1")]
    f1_score: String,
}

/// Show per-model evaluation metrics, best F1 first
pub async fn show_metrics(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let records = client.metrics().await?;

    match format {
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Table => {
            if records.is_empty() {
                print_warning("No metrics recorded");
                return Ok(());
            }

            let mut ranked: Vec<_> = records.iter().collect();
            ranked.sort_by(|a, b| b.1.f1_score.total_cmp(&a.1.f1_score));

            let rows: Vec<MetricsRow> = ranked
                .iter()
                .map(|(model, record)| MetricsRow {
                    model: model.to_string(),
                    accuracy: color_score(record.accuracy),
                    precision: format_percent(record.precision),
                    recall: format_percent(record.recall),
                    f1_score: color_score(record.f1_score),
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}
