//! Sheetslip - payroll spreadsheets to per-person PDF reports
//!
//! Main entry point for the sheetslip CLI application.

use std::process::ExitCode;

use console::style;
use tracing_subscriber::EnvFilter;

use sheetslip::cli::{self, Cli, Commands};
use sheetslip::config::{Config, LoggingConfig};
use sheetslip::error::Result;

/// Application banner
const BANNER: &str = r#"
  ┌─┐┬ ┬┌─┐┌─┐┌┬┐┌─┐┬  ┬┌─┐
  └─┐├─┤├┤ ├┤  │ └─┐│  │├─┘
  └─┘┴ ┴└─┘└─┘ ┴ └─┘┴─┘┴┴
"#;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let result = Config::resolve_path(cli.config.as_deref()).and_then(|path| {
        let config = match Config::load_from(&path) {
            Ok(config) => config,
            // `config reset` and `config init --force` must work on a broken file
            Err(_) if matches!(cli.command, Commands::Config(_)) => Config::default(),
            Err(e) => return Err(e),
        };
        setup_logging(&cli, &config.logging);
        run(cli, config, path)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Set up logging from CLI flags and the `[logging]` section
fn setup_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(logging.color)
        .without_time()
        .init();
}

/// Main application logic
fn run(cli: Cli, config: Config, config_path: std::path::PathBuf) -> Result<()> {
    if !cli.quiet {
        if let Commands::Convert(_) = &cli.command {
            println!("{}", style(BANNER).cyan());
            println!("  {} v{}\n",
                style("sheetslip").bold(),
                style(sheetslip::VERSION).dim()
            );
        }
    }

    // Set number of parallel jobs
    if let Some(jobs) = cli.jobs.or(config.general.jobs) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    match cli.command {
        Commands::Convert(args) => cli::execute_convert(&args, &config, cli.quiet),
        Commands::Inspect(args) => cli::execute_inspect(&args, &config),
        Commands::Doctor => cli::execute_doctor(&config, &config_path),
        Commands::Config(args) => cli::execute_config(&args, &config_path),
    }
}
