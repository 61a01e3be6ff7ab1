//! vcf2sql - export variants as loadable MySQL tables and a D2RQ mapping

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use vcf2sql_common::logging::{init_logging, LogConfig, LogLevel};
use vcf2sql_export::config::ExportConfig;
use vcf2sql_export::source::JsonLinesSource;
use vcf2sql_export::Exporter;

#[derive(Parser, Debug)]
#[command(name = "vcf2sql")]
#[command(author, version, about = "Export variant records to a zip of MySQL tables and a D2RQ mapping")]
struct Cli {
    /// Input file: a header line followed by one JSON record per line
    input: PathBuf,

    /// Output archive, must end with .zip
    #[arg(short, long)]
    output: PathBuf,

    /// Directory for staging files (defaults to the output's directory)
    #[arg(long, env = "VCF2SQL_TMP_DIR")]
    tmp_dir: Option<PathBuf>,

    /// Records between progress messages
    #[arg(long, env = "VCF2SQL_PROGRESS_INTERVAL")]
    progress_interval: Option<u64>,

    /// Print the export summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("vcf2sql")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;

    let _guard = init_logging(&log_config)?;

    let mut config = ExportConfig::load(&cli.output)?;
    if let Some(dir) = cli.tmp_dir {
        config.tmp_dir = Some(dir);
    }
    if let Some(interval) = cli.progress_interval {
        config.progress_interval = interval;
    }

    let mut source = JsonLinesSource::open(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;

    info!(input = %cli.input.display(), output = %config.output.display(), "Starting export");
    let summary = Exporter::new(config)?.run(&mut source)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    info!(
        records = summary.records,
        archive = %summary.archive.display(),
        sha256 = %summary.sha256,
        "Export complete"
    );
    Ok(())
}
