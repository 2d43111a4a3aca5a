//! CLI entry point for the lap event analyzer.
//!
//! Each subcommand reads the season's lap-level CSV exports and writes one
//! or more derived CSV reports plus a run manifest.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lap_events::analyzers::analyzer::{Report, analyze};
use lap_events::config::AnalysisConfig;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "lap_events")]
#[command(about = "Derive pit stop and position reports from lap data", long_about = None)]
struct Cli {
    /// JSON config file; defaults are used when omitted
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the input CSV files
    #[arg(short, long, global = true)]
    dataset_dir: Option<PathBuf>,

    /// Directory the reports are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Pit stop count and timing per driver and race
    PitStops,
    /// Lap time consistency against pit stops, plus stint listing
    Consistency,
    /// Average lap time per driver
    LapTimes,
    /// Average lap time per driver and tyre compound
    Compounds,
    /// Lap time degradation by tyre age
    TyreDelta,
    /// Race length, pit stops and most used tyre
    RaceLength,
    /// Laps joined with the weather reading in effect
    Weather,
    /// Position gained or lost across each pit stop
    PositionChanges,
    /// Average position per driver and compound
    AveragePositions,
    /// Finishing position by number of pit stops
    PitStopsVsPosition,
    /// Finishing position by starting compound
    StartingCompound,
    /// Every report above
    All,
}

impl Commands {
    fn reports(self) -> Vec<Report> {
        let report = match self {
            Commands::All => return Report::ALL.to_vec(),
            Commands::PitStops => Report::PitStops,
            Commands::Consistency => Report::Consistency,
            Commands::LapTimes => Report::LapTimes,
            Commands::Compounds => Report::Compounds,
            Commands::TyreDelta => Report::TyreDelta,
            Commands::RaceLength => Report::RaceLength,
            Commands::Weather => Report::Weather,
            Commands::PositionChanges => Report::PositionChanges,
            Commands::AveragePositions => Report::AveragePositions,
            Commands::PitStopsVsPosition => Report::PitStopsVsPosition,
            Commands::StartingCompound => Report::StartingCompound,
        };
        vec![report]
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/lap_events.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("lap_events.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(Directive::from(
            tracing::level_filters::LevelFilter::INFO,
        )));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(Directive::from(
            tracing::level_filters::LevelFilter::DEBUG,
        )));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let reports = cli.command.reports();

    info!(
        dataset_dir = %config.dataset_dir.display(),
        output_dir = %config.output_dir.display(),
        reports = reports.len(),
        "Starting analysis"
    );

    let manifest = analyze(&config, &reports).with_context(|| {
        format!(
            "analysis failed for dataset in {}",
            config.dataset_dir.display()
        )
    })?;

    info!(files = manifest.reports.len(), "Done");
    Ok(())
}

/// Config file (or defaults), then environment, then command-line flags.
fn resolve_config(cli: &Cli) -> Result<AnalysisConfig> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    let mut config = config.with_env_overrides();

    if let Some(dir) = &cli.dataset_dir {
        config.dataset_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}
