//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a [0, 1] fraction as a percentage
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Format a feature value the way the dataset writes them
pub fn format_feature(value: f64) -> String {
    format!("{:.2}", value)
}

/// Color a quality grade: A green, B yellow, C red
pub fn color_grade(grade: &str) -> String {
    match grade {
        "A" => grade.green().bold().to_string(),
        "B" => grade.yellow().bold().to_string(),
        "C" => grade.red().bold().to_string(),
        _ => grade.to_string(),
    }
}

/// Color an evaluation score based on value
pub fn color_score(value: f64) -> String {
    let formatted = format_percent(value);
    if value >= 0.9 {
        formatted.green().to_string()
    } else if value >= 0.75 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Compact `label=pct` list, most likely label first
pub fn format_proba(proba: &BTreeMap<String, f64>) -> String {
    let mut entries: Vec<_> = proba.iter().collect();
    entries.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .map(|(label, p)| format!("{}={}", label, format_percent(*p)))
        .collect::<Vec<_>>()
        .join(" ")
}
