use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sheettally_core::batch::{self, SortKey};
use sheettally_core::{Manifest, TallyConfig};
use std::path::PathBuf;
use tracing::Level;

mod formatter;

#[derive(Parser)]
#[command(name = "sheettally")]
#[command(about = "Aggregate test progress from Excel/ODS tracking sheets", long_about = None)]
#[command(version)]
struct Cli {
    /// Spreadsheet files or directories to aggregate
    #[arg(value_name = "PATH", required = true)]
    inputs: Vec<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Order of the file listing
    #[arg(long, value_enum, default_value = "file")]
    sort: SortOrder,

    /// Save the results as a project manifest (JSON)
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Project name stored in the manifest
    #[arg(long, default_value = "")]
    project: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for further processing
    Json,
}

#[derive(Clone, ValueEnum)]
enum SortOrder {
    File,
    StartDate,
    LastUpdate,
}

impl From<SortOrder> for SortKey {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::File => SortKey::File,
            SortOrder::StartDate => SortKey::StartDate,
            SortOrder::LastUpdate => SortKey::LastUpdate,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<TallyConfig> {
    if let Some(config_path) = path {
        return TallyConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // Fall back to sheettally.toml in the current directory
    let default_config_path = PathBuf::from("sheettally.toml");
    if default_config_path.exists() {
        TallyConfig::from_file(&default_config_path).with_context(|| {
            format!(
                "Failed to load config from {}",
                default_config_path.display()
            )
        })
    } else {
        Ok(TallyConfig::default())
    }
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;
    config.validate().context("Invalid configuration")?;

    let files = batch::collect_input_files(&cli.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No spreadsheet files found");
    }
    tracing::info!("Aggregating {} file(s)", files.len());

    let mut report = batch::process_files(&files, &config);
    report.sort_by(cli.sort.into());

    match cli.format {
        OutputFormat::Human => formatter::print_human(&report, &config),
        OutputFormat::Json => formatter::print_json(&report)?,
    }

    if let Some(path) = &cli.manifest {
        Manifest::new(cli.project.clone(), report.reports.clone())
            .save(path)
            .with_context(|| format!("Failed to save manifest to {}", path.display()))?;
        tracing::info!("Manifest written to {}", path.display());
    }

    let exit_code = if report.has_errors() { 1 } else { 0 };
    std::process::exit(exit_code);
}
