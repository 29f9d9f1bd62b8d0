//! Single prediction

use anyhow::Result;
use colored::Colorize;
use server_lib::FeatureVector;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_grade, format_percent, print_info, print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct ProbaRow {
    #[tabled(rename = "Grade")]
    grade: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

/// Classify one sample with `model`
pub async fn predict(
    client: &ApiClient,
    features: FeatureVector,
    model: &str,
    format: OutputFormat,
) -> Result<()> {
    let result = client.predict(&features, model).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!(
                "{} {} {}",
                "Prediction:".bold(),
                color_grade(&result.prediction),
                format!("({})", result.model).dimmed()
            );

            match &result.proba {
                Some(proba) => {
                    println!();
                    let rows: Vec<ProbaRow> = proba
                        .iter()
                        .map(|(grade, p)| ProbaRow {
                            grade: color_grade(grade),
                            probability: format_percent(*p),
                        })
                        .collect();
                    print_table(rows);
                }
                None => print_info("Model does not provide probability estimates"),
            }
        }
    }

    Ok(())
}
