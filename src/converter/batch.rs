//! Spreadsheet to PDF batch conversion
//!
//! One workbook becomes one PDF per distinct value of the name column.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Result, SheetslipError};
use crate::models::{ReportLayout, Table};
use crate::parsers::ExcelParser;
use crate::render::{OutputNamer, PayslipRenderer};

/// Everything needed to write the PDFs of one workbook
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    /// Source workbook
    pub input: PathBuf,
    /// Directory receiving the PDFs
    pub output_dir: PathBuf,
    /// Parsed sheet
    pub table: Table,
    /// Index of the name column
    pub name_column: usize,
    /// Table layout used for every PDF
    pub layout: ReportLayout,
    /// Person name and target file, in sheet order
    pub targets: Vec<(String, PathBuf)>,
}

/// Outcome of converting one workbook
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionSummary {
    /// Source workbook
    pub input: PathBuf,
    /// Directory receiving the PDFs
    pub output_dir: PathBuf,
    /// PDFs written
    pub created: Vec<PathBuf>,
    /// Person name and error message for each PDF that failed
    pub failures: Vec<(String, String)>,
}

impl ConversionSummary {
    /// Number of PDFs written
    pub fn success_count(&self) -> usize {
        self.created.len()
    }

    /// Number of PDFs that failed
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether every PDF was written
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Converts workbooks into per-person PDFs
#[derive(Debug, Clone)]
pub struct Converter {
    renderer: PayslipRenderer,
    name_column: String,
    sheet: Option<String>,
}

impl Converter {
    /// Create a converter keyed on `name_column`
    pub fn new(
        renderer: PayslipRenderer,
        name_column: impl Into<String>,
        sheet: Option<String>,
    ) -> Self {
        Self {
            renderer,
            name_column: name_column.into(),
            sheet,
        }
    }

    /// Column the converter groups rows by
    pub fn name_column(&self) -> &str {
        &self.name_column
    }

    /// Change the column rows are grouped by
    pub fn set_name_column(&mut self, name_column: impl Into<String>) {
        self.name_column = name_column.into();
    }

    /// Read the configured sheet of a workbook
    pub fn load(&self, input: &Path) -> Result<Table> {
        ExcelParser::new(input)?.parse(self.sheet.as_deref())
    }

    /// Validate a parsed table and work out the target file of every person
    pub fn plan_table(
        &self,
        input: &Path,
        table: Table,
        output_dir: &Path,
    ) -> Result<ConversionPlan> {
        let name_column = table
            .column_index(&self.name_column)
            .ok_or_else(|| SheetslipError::column_not_found(&self.name_column, &table.headers))?;

        let layout = ReportLayout::for_columns(
            table.column_count(),
            self.renderer.style().vertical_threshold,
        );

        let mut namer = OutputNamer::new();
        let targets: Vec<(String, PathBuf)> = table
            .unique_values(name_column)
            .into_iter()
            .map(|name| {
                let path = namer.path_for(output_dir, &name);
                (name, path)
            })
            .collect();

        tracing::info!(
            "{}: {} people, {} columns, {} layout",
            input.display(),
            targets.len(),
            table.column_count(),
            layout
        );

        Ok(ConversionPlan {
            input: input.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            table,
            name_column,
            layout,
            targets,
        })
    }

    /// Read and plan a workbook without writing anything
    pub fn plan_file(&self, input: &Path, output_dir: &Path) -> Result<ConversionPlan> {
        let table = self.load(input)?;
        self.plan_table(input, table, output_dir)
    }

    /// Write every PDF of a plan. Individual failures are collected, not fatal.
    pub fn execute(
        &self,
        plan: &ConversionPlan,
        generated_at: NaiveDateTime,
        progress: &ProgressBar,
    ) -> Result<ConversionSummary> {
        std::fs::create_dir_all(&plan.output_dir)?;
        progress.set_length(plan.targets.len() as u64);

        let results: Vec<(String, PathBuf, Result<()>)> = plan
            .targets
            .par_iter()
            .map(|(name, path)| {
                progress.set_message(format!("Processing {}", name));
                let result = plan
                    .table
                    .record_for(plan.name_column, name)
                    .ok_or_else(|| SheetslipError::render(format!("no row for '{}'", name)))
                    .and_then(|record| self.renderer.render(&record, generated_at, path));
                progress.inc(1);
                (name.clone(), path.clone(), result)
            })
            .collect();

        let mut summary = ConversionSummary {
            input: plan.input.clone(),
            output_dir: plan.output_dir.clone(),
            ..Default::default()
        };

        for (name, path, result) in results {
            match result {
                Ok(()) => summary.created.push(path),
                Err(e) => {
                    tracing::error!("Error creating PDF for {}: {}", name, e);
                    summary.failures.push((name, e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    /// Read, plan and write a workbook in one step
    pub fn convert_file(
        &self,
        input: &Path,
        output_dir: &Path,
        progress: &ProgressBar,
    ) -> Result<ConversionSummary> {
        let plan = self.plan_file(input, output_dir)?;
        self.execute(&plan, chrono::Local::now().naive_local(), progress)
    }
}

/// Output directory for one of several inputs: a subdirectory named after the file
pub fn output_dir_for(base: &Path, input: &Path, multiple: bool) -> PathBuf {
    if multiple {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workbook".to_string());
        base.join(stem)
    } else {
        base.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use crate::render::{FontSource, ReportStyle};
    use crate::shaping::TextShaper;

    fn converter(name_column: &str) -> Converter {
        let renderer = PayslipRenderer::new(
            FontSource::Builtin,
            TextShaper::default(),
            ReportStyle::default(),
        );
        Converter::new(renderer, name_column, None)
    }

    fn payroll() -> Table {
        Table::from_rows(vec![
            vec!["نام".into(), "حقوق".into(), "مزایا".into()],
            vec!["علی".into(), Cell::Int(1500), Cell::Empty],
            vec!["مریم".into(), Cell::Int(2000), Cell::Int(300)],
            vec!["علی".into(), Cell::Int(1700), Cell::Int(100)],
            vec![Cell::Empty, Cell::Int(1), Cell::Int(2)],
            vec!["Ali/".into(), Cell::Int(1), Cell::Int(2)],
            vec!["Ali".into(), Cell::Int(1), Cell::Int(2)],
        ])
        .unwrap()
    }

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_plan_lists_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let plan = converter("نام")
            .plan_table(Path::new("payroll.xlsx"), payroll(), dir.path())
            .unwrap();

        let names: Vec<&str> = plan.targets.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["علی", "مریم", "Ali/", "Ali"]);
        assert_eq!(plan.targets[3].1, dir.path().join("Ali (2).pdf"));
        assert_eq!(plan.layout, ReportLayout::Horizontal);
        // Planning never touches the disk
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_name_column() {
        let err = converter("Name")
            .plan_table(Path::new("payroll.xlsx"), payroll(), Path::new("out"))
            .unwrap_err();
        match err {
            SheetslipError::ColumnNotFound { name, available, .. } => {
                assert_eq!(name, "Name");
                assert_eq!(available, vec!["نام", "حقوق", "مزایا"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_execute_writes_one_pdf_per_person() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("pdfs");
        let converter = converter("نام");
        let plan = converter
            .plan_table(Path::new("payroll.xlsx"), payroll(), &output)
            .unwrap();

        let summary = converter.execute(&plan, now(), &ProgressBar::hidden()).unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.success_count(), 4);
        assert!(output.join("علی.pdf").is_file());
        assert!(output.join("مریم.pdf").is_file());
        assert!(output.join("Ali.pdf").is_file());
        assert!(output.join("Ali (2).pdf").is_file());
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let converter = converter("نام");
        let mut plan = converter
            .plan_table(Path::new("payroll.xlsx"), payroll(), dir.path())
            .unwrap();
        // A target inside a missing directory cannot be created
        plan.targets[1].1 = dir.path().join("missing").join("x.pdf");

        let summary = converter.execute(&plan, now(), &ProgressBar::hidden()).unwrap();

        assert_eq!(summary.success_count(), 3);
        assert_eq!(summary.error_count(), 1);
        assert_eq!(summary.failures[0].0, "مریم");
    }

    #[test]
    fn test_output_dir_for_multiple_inputs() {
        let base = Path::new("/out");
        let input = Path::new("/data/jan.xlsx");
        assert_eq!(output_dir_for(base, input, false), PathBuf::from("/out"));
        assert_eq!(output_dir_for(base, input, true), PathBuf::from("/out/jan"));
    }

    #[test]
    fn test_convert_file_from_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("payroll.xlsx");
        crate::parsers::excel::fixtures::write_payroll(&input, "نام");
        let output = dir.path().join("pdfs");

        let summary = converter("نام")
            .convert_file(&input, &output, &ProgressBar::hidden())
            .unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.success_count(), 2);
        assert!(output.join("علی.pdf").is_file());
        assert!(output.join("مریم.pdf").is_file());
    }
}
