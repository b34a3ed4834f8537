pub mod csv;
pub mod xlsx;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::error::{AppError, Result};

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("static regex"));

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(AppError::ValidationError(format!(
                "Unsupported export format: {}",
                other
            ))),
        }
    }
}

/// A single worksheet worth of text cells.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

pub fn render(sheet: &Sheet, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Xlsx => xlsx::write_sheet(sheet),
        ExportFormat::Csv => csv::write_sheet(sheet),
    }
}

pub fn sanitize_filename(name: &str) -> String {
    let sanitized = UNSAFE_FILENAME_CHARS.replace_all(name.trim(), "_").to_string();
    if sanitized.is_empty() {
        "export".to_string()
    } else {
        sanitized
    }
}
