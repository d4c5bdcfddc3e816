//! Command execution handlers

use std::path::{Path, PathBuf};

use console::style;
use serde::Serialize;

use crate::config::Config;
use crate::converter::{ConversionPlan, ConversionSummary, Converter};
use crate::error::{Result, SheetslipError};
use crate::models::ReportLayout;
use crate::parsers::{collect_inputs, normalize_input_path, ExcelParser};
use crate::render::{FontLocator, PayslipRenderer, ReportStyle};
use crate::shaping::TextShaper;

/// Paths longer than this are shortened in status output
const DISPLAY_PATH_LEN: usize = 40;

/// Build the renderer from configuration and command-line overrides
pub fn build_renderer(
    config: &Config,
    font: Option<&Path>,
    no_shaping: bool,
) -> Result<PayslipRenderer> {
    let font = FontLocator::new(&config.fonts).locate(font)?;

    let mut shaping = config.shaping.clone();
    if no_shaping {
        shaping.enabled = false;
    }

    Ok(PayslipRenderer::new(
        font,
        TextShaper::from_config(&shaping),
        ReportStyle::from(&config.report),
    ))
}

/// Execute the convert command
pub fn execute_convert(args: &super::ConvertArgs, config: &Config, quiet: bool) -> Result<()> {
    use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

    let requested: Vec<PathBuf> = args.input.iter().map(|raw| normalize_input_path(raw)).collect();
    let inputs = collect_inputs(&requested)?;
    if inputs.is_empty() {
        return Err(SheetslipError::Other(
            "No Excel files found (.xls, .xlsx, .xlsm, .xlsb)".into(),
        ));
    }

    let output_base = args
        .output
        .clone()
        .unwrap_or_else(|| config.general.output_dir.clone());
    let name_column = args
        .name_column
        .clone()
        .unwrap_or_else(|| config.report.name_column.clone());
    let sheet = args.sheet.clone().or_else(|| config.report.sheet.clone());

    let renderer = build_renderer(config, args.font.as_deref(), args.no_shaping)?;
    let mut converter = Converter::new(renderer, name_column, sheet);

    let interactive = !(args.yes || config.general.auto_yes) && console::user_attended();
    let multiple = inputs.len() > 1;

    let multi = MultiProgress::new();
    if quiet {
        multi.set_draw_target(ProgressDrawTarget::hidden());
    }
    let bar_style = ProgressStyle::with_template(
        "{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}"
    )
    .map_err(|e| SheetslipError::Other(e.to_string()))?
    .progress_chars("█▓▒░ ");

    let mut summaries: Vec<ConversionSummary> = Vec::new();
    let mut skipped: Vec<(PathBuf, SheetslipError)> = Vec::new();

    for input in &inputs {
        let output_dir = crate::converter::output_dir_for(&output_base, input, multiple);
        let plan = match plan_with_prompt(&mut converter, input, &output_dir, interactive) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!("Skipping {}: {}", input.display(), e);
                skipped.push((input.clone(), e));
                continue;
            }
        };

        if args.dry_run {
            print_plan(&plan);
            continue;
        }

        let pb = multi.add(ProgressBar::new(plan.targets.len() as u64));
        pb.set_style(bar_style.clone());
        pb.set_prefix(
            input
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned(),
        );

        match converter.execute(&plan, chrono::Local::now().naive_local(), &pb) {
            Ok(summary) => {
                pb.finish_with_message(format!(
                    "Completed: {} PDFs created",
                    summary.success_count()
                ));
                summaries.push(summary);
            }
            Err(e) => {
                pb.abandon_with_message("Failed");
                tracing::error!("Skipping {}: {}", input.display(), e);
                skipped.push((input.clone(), e));
            }
        }
    }

    // A lone workbook that could not be converted reports its own error
    if inputs.len() == 1 && summaries.is_empty() {
        if let Some((_, e)) = skipped.pop() {
            return Err(e);
        }
    }

    if !quiet {
        for summary in &summaries {
            print_summary(summary);
        }
        for (input, error) in &skipped {
            println!();
            println!("{} {}", style("Skipped:").red().bold(), input.display());
            println!("  {}", error);
        }
    }

    let created: usize = summaries.iter().map(ConversionSummary::success_count).sum();
    let failed: usize = summaries.iter().map(ConversionSummary::error_count).sum::<usize>()
        + skipped.len();

    if !args.dry_run && (args.open || config.general.open_output) && created > 0 {
        let dir = if multiple { output_base.clone() } else { summaries[0].output_dir.clone() };
        if let Err(e) = open_directory(&dir) {
            tracing::warn!("Could not open {}: {}", dir.display(), e);
        }
    }

    if failed > 0 {
        return Err(SheetslipError::PartialFailure {
            failed,
            total: created + failed,
        });
    }

    Ok(())
}

/// Plan a workbook, asking for another name column when the configured one is missing
fn plan_with_prompt(
    converter: &mut Converter,
    input: &Path,
    output_dir: &Path,
    interactive: bool,
) -> Result<ConversionPlan> {
    let table = converter.load(input)?;

    let missing = table.column_index(converter.name_column()).is_none();
    if interactive && missing && !table.headers.is_empty() {
        let prompt = format!(
            "Column '{}' not found in {}. Which column holds the names?",
            converter.name_column(),
            input.display()
        );
        let choice = dialoguer::Select::new()
            .with_prompt(prompt)
            .items(&table.headers)
            .default(0)
            .interact_opt()
            .map_err(|e| SheetslipError::Other(e.to_string()))?;

        if let Some(idx) = choice {
            converter.set_name_column(table.headers[idx].clone());
        }
    }

    converter.plan_table(input, table, output_dir)
}

fn print_plan(plan: &ConversionPlan) {
    println!(
        "{} {} ({} people, {} layout)",
        style("Would convert").bold(),
        plan.input.display(),
        plan.targets.len(),
        plan.layout
    );
    for (name, path) in &plan.targets {
        println!("  {} -> {}", name, path.display());
    }
}

fn print_summary(summary: &ConversionSummary) {
    println!();
    println!("{} {}", style("Conversion complete:").bold(), summary.input.display());
    println!(
        "  {} Success: {} PDFs created",
        style("✓").green(),
        summary.success_count()
    );
    if summary.error_count() > 0 {
        println!(
            "  {} Errors: {} PDFs failed",
            style("✗").red(),
            summary.error_count()
        );
        for (name, error) in &summary.failures {
            println!("    • {}: {}", name, error);
        }
    }
    println!(
        "  Output directory: {}",
        style(shorten_path(&summary.output_dir.display().to_string(), DISPLAY_PATH_LEN)).cyan()
    );
}

/// Shorten a path for display, keeping its end
pub fn shorten_path(path: &str, max_length: usize) -> String {
    let count = path.chars().count();
    if count <= max_length {
        return path.to_string();
    }
    let keep = max_length.saturating_sub(3);
    let tail: String = path.chars().skip(count - keep).collect();
    format!("...{}", tail)
}

/// Open a directory in the platform file manager
pub fn open_directory(path: &Path) -> Result<()> {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };

    std::process::Command::new(program).arg(path).spawn()?;
    Ok(())
}

/// Workbook overview printed by `inspect`
#[derive(Debug, Serialize)]
pub struct WorkbookReport {
    /// Workbook path
    pub path: PathBuf,
    /// All sheet names
    pub sheets: Vec<String>,
    /// Sheet that was read
    pub sheet: String,
    /// Column names
    pub columns: Vec<String>,
    /// Number of data rows
    pub rows: usize,
    /// Name column searched for
    pub name_column: String,
    /// Whether the name column exists
    pub name_column_found: bool,
    /// Distinct names (empty when the column is missing)
    pub people: Vec<String>,
    /// Layout the PDFs would use
    pub layout: ReportLayout,
}

/// Execute the inspect command
pub fn execute_inspect(args: &super::InspectArgs, config: &Config) -> Result<()> {
    let input = normalize_input_path(&args.input);
    let parser = ExcelParser::new(&input)?;
    let sheets = parser.sheet_names()?;

    let sheet = args.sheet.clone().or_else(|| config.report.sheet.clone());
    let table = parser.parse(sheet.as_deref())?;

    let name_column = args
        .name_column
        .clone()
        .unwrap_or_else(|| config.report.name_column.clone());
    let column_idx = table.column_index(&name_column);

    let report = WorkbookReport {
        path: input.clone(),
        sheet: sheet.unwrap_or_else(|| sheets.first().cloned().unwrap_or_default()),
        sheets,
        columns: table.headers.clone(),
        rows: table.rows.len(),
        name_column_found: column_idx.is_some(),
        people: column_idx.map(|idx| table.unique_values(idx)).unwrap_or_default(),
        layout: ReportLayout::for_columns(table.column_count(), config.report.vertical_threshold),
        name_column,
    };

    match args.format {
        super::InfoFormat::Pretty => {
            println!("{}", style("Workbook Information").bold().underlined());
            println!("File:     {}", report.path.display());
            println!("Sheets:   {}", report.sheets.join(", "));
            println!("Sheet:    {}", report.sheet);
            println!("Rows:     {}", report.rows);
            println!("Layout:   {}", report.layout);
            println!("\nColumns ({}):", report.columns.len());
            for column in &report.columns {
                let marker = if *column == report.name_column {
                    style("*").green()
                } else {
                    style(" ")
                };
                println!("  {} {}", marker, column);
            }

            if report.name_column_found {
                println!("\nPeople ({}):", report.people.len());
                for name in report.people.iter().take(20) {
                    println!("  - {}", name);
                }
                if report.people.len() > 20 {
                    println!("  ... and {} more", report.people.len() - 20);
                }
            } else {
                println!(
                    "\n{} Name column '{}' not found",
                    style("⚠").yellow(),
                    report.name_column
                );
            }
        }
        super::InfoFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        super::InfoFormat::Toml => {
            println!("{}", toml::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Execute the doctor command
pub fn execute_doctor(config: &Config, config_path: &Path) -> Result<()> {
    let font = FontLocator::new(&config.fonts).locate(None)?;
    let shaper = TextShaper::from_config(&config.shaping);

    println!("{}", style("Sheetslip Doctor").bold().underlined());

    let config_state = if config_path.exists() { "found" } else { "not found, using defaults" };
    println!("Config:   {} ({})", config_path.display(), config_state);

    if font.is_builtin() {
        println!(
            "Font:     {} {}",
            style("⚠").yellow(),
            "Persian font not found, using Helvetica"
        );
        println!("          Place one of these files in ./fonts or a system font directory:");
        for name in &config.fonts.names {
            println!("            {}", name);
        }
    } else {
        println!("Font:     {} {}", style("✓").green(), font.describe());
    }

    if shaper.is_enabled() {
        println!("Shaping:  {} Persian text support enabled", style("✓").green());
    } else {
        println!("Shaping:  {} disabled (shaping.enabled = false)", style("⚠").yellow());
    }

    println!("Formats:  {}", crate::parsers::excel::EXCEL_EXTENSIONS.join(", "));

    Ok(())
}

/// Execute the config command
pub fn execute_config(args: &super::ConfigArgs, config_path: &Path) -> Result<()> {
    match &args.command {
        super::ConfigCommands::Show => {
            let config = Config::load_from(config_path)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        super::ConfigCommands::Edit => {
            if !config_path.exists() {
                Config::init(config_path, false)?;
            }
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
            std::process::Command::new(editor)
                .arg(config_path)
                .status()?;
        }
        super::ConfigCommands::Reset => {
            Config::reset(config_path)?;
            println!("Configuration reset to defaults");
        }
        super::ConfigCommands::Set { key, value } => {
            let mut config = Config::load_from(config_path)?;
            config.set(key, value)?;
            config.save_to(config_path)?;
            println!("Set {} = {}", key, value);
        }
        super::ConfigCommands::Get { key } => {
            let config = Config::load_from(config_path)?;
            if let Some(value) = config.get(key) {
                println!("{}", value);
            } else {
                println!("Key '{}' not found", key);
            }
        }
        super::ConfigCommands::Init { force } => {
            Config::init(config_path, *force)?;
            println!("Configuration initialized at {}", config_path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/short/path", "/short/path")]
    #[case(
        "/home/someone/Documents/payroll/2024/output_pdfs",
        "...ocuments/payroll/2024/output_pdfs"
    )]
    fn test_shorten_path(#[case] path: &str, #[case] expected: &str) {
        let shortened = shorten_path(path, 36);
        assert_eq!(shortened, expected);
        assert!(shortened.chars().count() <= 36);
    }

    #[test]
    fn test_shorten_path_counts_characters() {
        let path = "/خانه/کاربر/اسناد/حقوق/۱۴۰۳/خروجی/فایل‌ها";
        let shortened = shorten_path(path, 20);
        assert!(shortened.starts_with("..."));
        assert_eq!(shortened.chars().count(), 20);
    }

    #[test]
    fn test_build_renderer_respects_no_shaping() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.fonts.search_dirs = vec![dir.path().to_path_buf()];

        let renderer = build_renderer(&config, None, true).unwrap();
        assert!(renderer.font().is_builtin());
        assert_eq!(renderer.style().vertical_threshold, 10);
        assert!(!renderer.shaper().is_enabled());
        assert_eq!(renderer.shaper().shape("نام"), "نام");

        let shaped = build_renderer(&config, None, false).unwrap();
        assert!(shaped.shaper().is_enabled());
        assert_ne!(shaped.shaper().shape("نام"), "نام");
    }

    fn convert_args(input: &Path, output: &Path) -> super::super::ConvertArgs {
        super::super::ConvertArgs {
            input: vec![input.display().to_string()],
            output: Some(output.to_path_buf()),
            name_column: None,
            sheet: None,
            font: None,
            no_shaping: false,
            open: false,
            dry_run: false,
            yes: true,
        }
    }

    fn builtin_font_config() -> Config {
        let mut config = Config::default();
        config.fonts.search_dirs = Vec::new();
        config
    }

    #[test]
    fn test_bad_workbook_does_not_stop_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = dir.path().join("inputs");
        std::fs::create_dir(&inputs).unwrap();
        // Sorted first, and lacks the name column
        crate::parsers::excel::fixtures::write_payroll(&inputs.join("a_bad.xlsx"), "Employee");
        crate::parsers::excel::fixtures::write_payroll(&inputs.join("b_good.xlsx"), "نام");
        let output = dir.path().join("out");

        let err = execute_convert(&convert_args(&inputs, &output), &builtin_font_config(), true)
            .unwrap_err();

        match err {
            SheetslipError::PartialFailure { failed, total } => {
                assert_eq!(failed, 1);
                assert_eq!(total, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(output.join("b_good").join("علی.pdf").is_file());
        assert!(output.join("b_good").join("مریم.pdf").is_file());
        assert!(!output.join("a_bad").exists());
    }

    #[test]
    fn test_single_bad_workbook_reports_its_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("payroll.xlsx");
        crate::parsers::excel::fixtures::write_payroll(&input, "Employee");

        let err = execute_convert(
            &convert_args(&input, &dir.path().join("out")),
            &builtin_font_config(),
            true,
        )
        .unwrap_err();

        assert!(matches!(err, SheetslipError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_config_set_and_get_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let args = super::super::ConfigArgs {
            command: super::super::ConfigCommands::Set {
                key: "report.name_column".into(),
                value: "Employee".into(),
            },
        };
        execute_config(&args, &path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.report.name_column, "Employee");
    }
}
