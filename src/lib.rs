//! Sheetslip - payroll spreadsheets to per-person PDF reports
//!
//! Sheetslip reads an Excel workbook, groups its rows by a name column and
//! writes one landscape A4 PDF per person. Persian and Arabic text is
//! reshaped and reordered so it renders correctly with an embedded
//! TrueType font.
//!
//! # Quick Start
//!
//! ```bash
//! # Convert a workbook into ./output_pdfs
//! sheetslip convert payroll.xlsx
//!
//! # Use another name column and output directory
//! sheetslip convert payroll.xlsx -n "Employee" -o slips/
//!
//! # Look at a workbook before converting
//! sheetslip inspect payroll.xlsx
//!
//! # Check which font will be embedded
//! sheetslip doctor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod models;
pub mod parsers;
pub mod render;
pub mod shaping;

// Re-export commonly used types
pub use converter::{ConversionSummary, Converter};
pub use error::{Result, SheetslipError};
pub use models::{Cell, PersonRecord, ReportLayout, Table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Quick conversion function for simple use cases
///
/// Uses the default configuration: the `نام` name column, the first sheet
/// and the first Persian font found on the system.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let summary = sheetslip::convert(
///         Path::new("payroll.xlsx"),
///         Path::new("./output_pdfs/"),
///     )?;
///
///     println!("Created {} PDFs", summary.success_count());
///     Ok(())
/// }
/// ```
pub fn convert(input: &std::path::Path, output_dir: &std::path::Path) -> Result<ConversionSummary> {
    let config = config::Config::default();
    let renderer = cli::build_renderer(&config, None, false)?;
    let converter = Converter::new(renderer, config.report.name_column, config.report.sheet);

    converter.convert_file(input, output_dir, &indicatif::ProgressBar::hidden())
}

/// Read a workbook without converting it
pub fn inspect(input: &std::path::Path, sheet: Option<&str>) -> Result<Table> {
    parsers::ExcelParser::new(input)?.parse(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "sheetslip");
    }

    #[test]
    fn test_manifest_declares_each_concern_once() {
        let manifest: toml::Table = toml::from_str(include_str!("../Cargo.toml")).unwrap();
        let deps = manifest["dependencies"].as_table().unwrap();

        for name in [
            "calamine",
            "printpdf",
            "ttf-parser",
            "unicode-bidi",
            "clap",
            "dialoguer",
            "indicatif",
            "serde",
            "thiserror",
            "tracing",
        ] {
            let version = match &deps[name] {
                toml::Value::String(v) => v.clone(),
                toml::Value::Table(t) => t["version"].as_str().unwrap().to_string(),
                other => panic!("unexpected entry for {name}: {other:?}"),
            };
            assert!(!version.trim().is_empty(), "{name} has no version");
        }

        let dev = manifest["dev-dependencies"].as_table().unwrap();
        for name in deps.keys() {
            assert!(!dev.contains_key(name), "{name} declared twice");
        }
    }

    #[test]
    fn test_inspect_missing_file() {
        let err = inspect(std::path::Path::new("/nonexistent/payroll.xlsx"), None).unwrap_err();
        assert!(matches!(err, SheetslipError::FileNotFound { .. }));
    }
}
