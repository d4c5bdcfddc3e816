//! Excel workbook parser
//!
//! Supports the formats calamine understands for spreadsheets users export
//! from payroll systems: .xls (BIFF), .xlsx/.xlsm (OOXML) and .xlsb.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{Result, SheetslipError};
use crate::models::{Cell, Table};

/// File extensions accepted as Excel input
pub const EXCEL_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb"];

/// Parser for Excel workbooks
pub struct ExcelParser {
    /// Path to the workbook
    path: PathBuf,
}

impl ExcelParser {
    /// Create a new parser for the given workbook
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(SheetslipError::file_not_found(&path));
        }

        if !is_excel_file(&path) {
            return Err(SheetslipError::UnsupportedFormat(path.display().to_string()));
        }

        Ok(Self { path })
    }

    /// Names of all worksheets in workbook order
    pub fn sheet_names(&self) -> Result<Vec<String>> {
        let workbook = open_workbook_auto(&self.path)?;
        Ok(workbook.sheet_names())
    }

    /// Read a worksheet into a table. `None` selects the first sheet.
    pub fn parse(&self, sheet: Option<&str>) -> Result<Table> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let available = workbook.sheet_names();

        let sheet_name = match sheet {
            Some(name) if available.iter().any(|s| s == name) => name.to_string(),
            Some(name) => {
                return Err(SheetslipError::SheetNotFound {
                    name: name.to_string(),
                    available,
                })
            }
            None => available
                .first()
                .cloned()
                .ok_or_else(|| SheetslipError::EmptySheet(self.path.display().to_string()))?,
        };

        tracing::debug!("Reading sheet '{}' from {}", sheet_name, self.path.display());

        let range = workbook.worksheet_range(&sheet_name)?;
        let raw: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();

        let table = Table::from_rows(raw).ok_or_else(|| {
            SheetslipError::EmptySheet(format!("{} [{}]", self.path.display(), sheet_name))
        })?;

        tracing::debug!(
            "Sheet '{}' has {} columns and {} rows",
            sheet_name,
            table.column_count(),
            table.rows.len()
        );

        Ok(table)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(Cell::DateTime)
                .unwrap_or_else(|| Cell::Float(dt.as_f64())),
            Data::DateTimeIso(s) => s
                .parse::<chrono::NaiveDateTime>()
                .map(Cell::DateTime)
                .unwrap_or_else(|_| Cell::Text(s.clone())),
            Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Error(e.to_string()),
        }
    }
}

/// Whether the path has one of the Excel extensions
pub fn is_excel_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXCEL_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Clean up a path as pasted or dropped by a user.
///
/// File managers wrap paths containing spaces in braces (`{C:/My File.xlsx}`)
/// and shells often leave quotes around them.
pub fn normalize_input_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let unbraced = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| unbraced.strip_prefix(*q).and_then(|s| s.strip_suffix(*q)))
        .unwrap_or(unbraced);
    PathBuf::from(unquoted)
}

/// Expand inputs: files are kept, directories contribute the Excel files inside them
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = Vec::new();
            for entry in walkdir::WalkDir::new(input).max_depth(1) {
                let entry = entry?;
                // Skip lock files Excel leaves next to open workbooks
                let is_lock = entry.file_name().to_string_lossy().starts_with("~$");
                if entry.file_type().is_file() && is_excel_file(entry.path()) && !is_lock {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            tracing::debug!("Found {} workbooks in {}", found.len(), input.display());
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}
