//! lagwatch latency report.
//!
//! Reads both streams from the event store, joins them on serial, and prints
//! how long operations took to propagate.
//!
//! # Usage
//!
//! ```bash
//! # Text report
//! lagwatch-analyze --store-path /data/events
//!
//! # Summary as JSON, every joined record to a file for plotting
//! lagwatch-analyze --json --records latencies.jsonl
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use lagwatch_analyze::{analyze, report};
use lagwatch_core::{Config, RocksStore};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lagwatch-analyze")]
#[command(about = "Report propagation latency between origin and confirmation events")]
#[command(version)]
struct Args {
    /// RocksDB event store path (overrides LAGWATCH_STORE_PATH)
    #[arg(long)]
    store_path: Option<PathBuf>,

    /// Write every joined record as JSON lines to this file
    #[arg(long)]
    records: Option<PathBuf>,

    /// Print the scan reports and summary as JSON
    #[arg(long)]
    json: bool,

    /// Path to .env file (optional)
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
    }

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut config = Config::from_env()?;
    if let Some(path) = args.store_path {
        config.store_path = path;
    }

    let store = RocksStore::open(&config.store_path)
        .with_context(|| format!("Failed to open event store at {:?}", config.store_path))?;

    let analysis = analyze(&store).context("Analysis failed")?;

    if let Some(path) = &args.records {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let written = report::write_records(&analysis.records, BufWriter::new(file))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Wrote {} records to {}", written, path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!();
        print!("{}", report::render_text(&analysis));
        println!();
    }

    Ok(())
}
