//! Sumi-Audit main entry point
//!
//! This is the command-line interface for the Sumi-Audit accessibility crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_audit::config::{load_config, Config};
use sumi_audit::crawler::{run_crawl, CrawlEvent, EventSink};
use sumi_audit::report::{
    load_template, print_statistics, to_report_model, write_html_report, write_json,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Sumi-Audit: an accessibility crawler
///
/// Sumi-Audit crawls a website from a seed URL, runs an accessibility engine
/// on every internal page with a distinct structure, and writes an HTML
/// report of all violations found.
#[derive(Parser, Debug)]
#[command(name = "sumi-audit")]
#[command(version)]
#[command(about = "An accessibility crawler", long_about = None)]
struct Cli {
    /// URL the crawl starts from; only pages on its origin are scanned
    #[arg(value_name = "SEED_URL")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    // Fail on a bad template before spending time on the crawl
    let template = load_template(config.output.template_path.as_deref())?;

    let (tx, rx) = mpsc::unbounded_channel();
    let drain = tokio::spawn(drain_events(rx));

    let outcome = run_crawl(&config, &cli.seed, EventSink::new(tx))
        .await
        .context("Crawl failed")?;

    // The sender was dropped with the coordinator, so the drain task ends
    if let Err(e) = drain.await {
        tracing::warn!("Event logger stopped unexpectedly: {}", e);
    }

    let model = to_report_model(&outcome.result);
    write_html_report(&model, &template, &config.output.report_path)
        .context("Failed to write the HTML report")?;

    if let Some(json_path) = &config.output.json_path {
        write_json(&outcome.result, json_path).context("Failed to write the JSON result")?;
    }

    if !cli.quiet {
        print_statistics(&outcome.statistics);
    }

    tracing::info!(
        "Report with {} violations written to {}",
        model.len(),
        config.output.report_path.display()
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_audit=info,warn"),
            1 => EnvFilter::new("sumi_audit=debug,info"),
            2 => EnvFilter::new("sumi_audit=trace,debug"),
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

/// Renders crawl events through `tracing` until the crawl drops its sender
async fn drain_events(mut rx: mpsc::UnboundedReceiver<CrawlEvent>) {
    while let Some(event) = rx.recv().await {
        event.log();
    }
}
