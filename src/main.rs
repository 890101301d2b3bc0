//! CLI entry point for the major transit stop finder.
//!
//! Reads an unpacked GTFS directory, merges route variants and intersection
//! stops, and writes the stops that qualify as major transit stops to a CSV.

use anyhow::Result;
use clap::Parser;
use major_transit_stops::{
    MajorStopClassifier, MergeConfig, MergedStop,
    output::{write_merged_stops, write_stop_buffers_geojson},
    parser::load_feed,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "major_transit_stops")]
#[command(about = "Process GTFS to find major transit stops", long_about = None)]
struct Cli {
    /// The directory of the unpacked GTFS
    #[arg(value_name = "GTFS_DIR")]
    gtfs_dir: PathBuf,

    /// The path to write the major transit stops to
    #[arg(short, long, default_value = "major_transit_stops.txt")]
    output: PathBuf,

    /// JSON file mapping agency ids to groups of duplicate route short names
    /// (defaults to the built-in SFMTA table)
    #[arg(long, value_name = "FILE")]
    merge_config: Option<PathBuf>,

    /// Also write the half-mile buffer around each major stop as GeoJSON
    #[arg(long, value_name = "FILE")]
    geojson: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging()?;

    let cli = Cli::parse();
    run(&cli)
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/major_transit_stops.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("major_transit_stops.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Classifies the whole feed before opening the output file, so an integrity
/// error leaves no partial output behind.
#[tracing::instrument(skip_all, fields(gtfs_dir = %cli.gtfs_dir.display(), output = %cli.output.display()))]
fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.merge_config {
        Some(path) => MergeConfig::load(path)?,
        None => MergeConfig::builtin()?,
    };

    let feed = load_feed(&cli.gtfs_dir)?;
    let classifier = MajorStopClassifier::new(&feed, &config)?;
    let evaluated = classifier.merged_stops().len();

    let stops: Vec<MergedStop> = classifier
        .major_stops()
        .collect::<Result<_, _>>()?;

    info!(
        evaluated,
        major = stops.len(),
        "Major transit stops identified"
    );

    write_merged_stops(&cli.output, &stops)?;
    if let Some(path) = &cli.geojson {
        write_stop_buffers_geojson(path, &stops)?;
    }
    Ok(())
}
