//! Worksheet table, per-person records and report layout

use serde::Serialize;

use super::Cell;

/// A worksheet with a header row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    /// Column names from the first row
    pub headers: Vec<String>,
    /// Data rows, each exactly `headers.len()` cells wide
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from raw rows where the first row holds the column names.
    ///
    /// Blank header cells are named `Unnamed: <index>`, short rows are padded
    /// with empty cells and rows without any value are dropped.
    pub fn from_rows(raw: Vec<Vec<Cell>>) -> Option<Self> {
        let mut iter = raw.into_iter();
        let header_row = iter.next()?;

        let headers: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                if cell.is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    cell.to_string().trim().to_string()
                }
            })
            .collect();

        let width = headers.len();
        let rows = iter
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Some(Self { headers, rows })
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Distinct non-empty values of a column, in order of first appearance
    pub fn unique_values(&self, column: usize) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|cell| !cell.is_empty())
            .map(|cell| cell.to_string())
            .filter(|value| seen.insert(value.clone()))
            .collect()
    }

    /// Rows whose `column` renders as `value`
    pub fn rows_matching<'a>(
        &'a self,
        column: usize,
        value: &'a str,
    ) -> impl Iterator<Item = &'a Vec<Cell>> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.get(column).is_some_and(|c| c.to_string() == value))
    }

    /// Build the record for one person from the first row carrying their name
    pub fn record_for(&self, column: usize, name: &str) -> Option<PersonRecord> {
        let row = self.rows_matching(column, name).next()?;
        Some(PersonRecord {
            name: name.to_string(),
            fields: self
                .headers
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
        })
    }
}

/// All values belonging to one person
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonRecord {
    /// Value of the name column
    pub name: String,
    /// Column name and value pairs in sheet order
    pub fields: Vec<(String, Cell)>,
}

/// How the value table is laid out on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLayout {
    /// One header row and one value row
    Horizontal,
    /// One row per column: value beside its label
    Vertical,
}

impl ReportLayout {
    /// Pick the layout for a sheet: wide sheets switch to vertical
    pub fn for_columns(column_count: usize, vertical_threshold: usize) -> Self {
        if column_count > vertical_threshold {
            Self::Vertical
        } else {
            Self::Horizontal
        }
    }
}

impl std::fmt::Display for ReportLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}
