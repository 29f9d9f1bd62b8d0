//! Model listing

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{print_json, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
}

/// Show loaded models and the feature order they expect
pub async fn show_models(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.models().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.models.is_empty() {
                print_warning("No models loaded");
                return Ok(());
            }

            let rows: Vec<ModelRow> = result
                .models
                .iter()
                .map(|name| ModelRow { name: name.clone() })
                .collect();
            print_table(rows);
            println!("\n{} {}", "Features:".bold(), result.features.join(", "));
        }
    }

    Ok(())
}
