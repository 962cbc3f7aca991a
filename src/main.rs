//! Trawline command-line entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use trawline::config::{load_config, Config};
use trawline::output::{export_path, write_records};
use trawline::storage::CheckpointStore;
use trawline::{regions, CrawlTask, JsonFileStore, Orchestrator, SelectorRule};
use tracing_subscriber::EnvFilter;

/// Trawline: a time-boxed catalog harvester
///
/// Walks a paginated catalog from the given start URL, extracts a record per
/// item page, and writes the results to CSV. Progress is checkpointed, so an
/// interrupted run resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "trawline")]
#[command(version = "1.0.0")]
#[command(about = "A time-boxed catalog harvester", long_about = None)]
struct Cli {
    /// First listing page to walk
    #[arg(value_name = "START_URL")]
    start_url: String,

    /// Region the catalog belongs to (resolves the base URL)
    #[arg(value_name = "REGION")]
    region: String,

    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory the CSV export is written into (overrides the config)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start fresh, discarding any existing checkpoint
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };

    // Fail on a bad region before touching the network or the checkpoint
    regions::base_url(&cli.region).with_context(|| {
        format!(
            "unsupported region {:?}; supported: {}",
            cli.region,
            regions::supported().join(", ")
        )
    })?;

    let store = JsonFileStore::new(&config.output.checkpoint_path);
    if cli.fresh {
        tracing::info!("Starting fresh, clearing checkpoint");
        store.clear()?;
    }

    let rule = Arc::new(SelectorRule::catalog()?);
    let export_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.export_dir));
    let orchestrator = Orchestrator::new(config, rule, store)?;

    let task = CrawlTask {
        start_url: cli.start_url,
        region: cli.region.clone(),
    };
    let report = orchestrator.run(task).await?;

    let csv_path = export_path(&export_dir, &cli.region);
    write_records(&csv_path, &report.records)?;

    println!("Pages scraped:    {}", report.pages_scraped);
    println!("Links found:      {}", report.links_found);
    println!("Records:          {}", report.records.len());
    println!("Unresolved links: {}", report.remaining_links.len());
    println!(
        "Walker calls:     {} / extractor calls: {}",
        report.walker_calls, report.extractor_calls
    );
    println!("Output:           {}", csv_path.display());

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trawline=info,warn"),
            1 => EnvFilter::new("trawline=debug,info"),
            2 => EnvFilter::new("trawline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
