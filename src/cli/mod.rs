//! Command-line interface for sheetslip

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sheetslip - payroll spreadsheets to per-employee PDF payslips
///
/// Reads an Excel workbook, groups rows by the employee name column and
/// writes one PDF report per employee, with Persian/Arabic text support.
#[derive(Parser, Debug)]
#[command(name = "sheetslip")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHEETSLIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of parallel jobs (default: number of CPUs)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert Excel workbooks into one PDF per person
    Convert(ConvertArgs),

    /// Show the columns and people found in a workbook
    Inspect(InspectArgs),

    /// Check font and text shaping support
    Doctor,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the convert command
#[derive(Parser, Debug, Clone)]
pub struct ConvertArgs {
    /// Excel file(s) or directories containing them
    #[arg(required = true)]
    pub input: Vec<String>,

    /// Output directory (default: ./output_pdfs)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Column holding the person's name
    #[arg(short, long)]
    pub name_column: Option<String>,

    /// Worksheet to read (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// TrueType font to embed
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Disable Persian/Arabic reshaping and reordering
    #[arg(long)]
    pub no_shaping: bool,

    /// Open the output directory when done
    #[arg(long)]
    pub open: bool,

    /// Show what would be created without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Skip interactive prompts
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Excel file to inspect
    #[arg(required = true)]
    pub input: String,

    /// Worksheet to read (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Column holding the person's name
    #[arg(short, long)]
    pub name_column: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = InfoFormat::Pretty)]
    pub format: InfoFormat,
}

/// Info output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InfoFormat {
    /// Human-readable pretty output
    Pretty,
    /// JSON output
    Json,
    /// TOML output
    Toml,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Edit configuration file
    Edit,
    /// Reset configuration to defaults
    Reset,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_args() {
        let cli = Cli::try_parse_from([
            "sheetslip", "convert", "a.xlsx", "b.xls", "-o", "out", "-n", "Name", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.input, vec!["a.xlsx", "b.xls"]);
                assert_eq!(args.output, Some(PathBuf::from("out")));
                assert_eq!(args.name_column.as_deref(), Some("Name"));
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
