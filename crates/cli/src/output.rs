//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
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

/// One labelled value in a two-column table
#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: impl Into<String>, value: impl ToString) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

/// Print `rows` as a table, or `value` as pretty JSON
pub fn print_report<T: Serialize>(value: &T, rows: Vec<FieldRow>, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Success line that keeps stdout a single JSON document in JSON mode
pub fn print_status(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Table => print_success(message),
        OutputFormat::Json => eprintln!("{} {}", "✓".green().bold(), message),
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a ratio as a percentage
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "high" => status.green().to_string(),
        "medium" => status.yellow().to_string(),
        "unhealthy" | "low" => status.red().to_string(),
        _ => status.to_string(),
    }
}
