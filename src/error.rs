//! Error types for sheetslip

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sheetslip operations
#[derive(Error, Debug)]
pub enum SheetslipError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Error reading Excel file: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] printpdf::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported file format: {0} (expected .xls, .xlsx, .xlsm or .xlsb)")]
    UnsupportedFormat(String),

    #[error("Sheet '{name}' not found. Available sheets: {}", .available.join(", "))]
    SheetNotFound { name: String, available: Vec<String> },

    #[error("Spreadsheet is empty: {0}")]
    EmptySheet(String),

    #[error("Column '{name}' not found.{}\nAvailable columns: {}",
        .suggestion.as_ref().map(|s| format!(" Did you mean '{}'?", s)).unwrap_or_default(),
        .available.join(", "))]
    ColumnNotFound {
        name: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },

    #[error("Font error: {0}")]
    Font(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("{failed} of {total} conversions failed")]
    PartialFailure { failed: usize, total: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for sheetslip operations
pub type Result<T> = std::result::Result<T, SheetslipError>;

impl SheetslipError {
    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a rendering error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create a font error
    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    /// Create a column-not-found error, suggesting the closest available column
    pub fn column_not_found(name: impl Into<String>, available: &[String]) -> Self {
        let name = name.into();
        let suggestion = available
            .iter()
            .map(|candidate| (candidate, strsim::normalized_levenshtein(&name, candidate)))
            .filter(|(_, score)| *score >= 0.5)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate.clone());

        Self::ColumnNotFound {
            name,
            available: available.to_vec(),
            suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_not_found_suggests_close_match() {
        let available = vec!["Name".to_string(), "Salary".to_string()];
        let err = SheetslipError::column_not_found("name", &available);
        match &err {
            SheetslipError::ColumnNotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("Name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("Did you mean 'Name'?"));
        assert!(msg.contains("Available columns: Name, Salary"));
    }

    #[test]
    fn test_column_not_found_without_suggestion() {
        let available = vec!["Salary".to_string()];
        let err = SheetslipError::column_not_found("نام", &available);
        assert!(!err.to_string().contains("Did you mean"));
    }
}
