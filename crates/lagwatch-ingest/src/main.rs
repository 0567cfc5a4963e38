//! lagwatch ingestion daemon.
//!
//! Reads producer records (one JSON API response per line) from a file or
//! stdin, buffers them, and writes origin-stream entries to the event store.
//!
//! # Usage
//!
//! ```bash
//! # Pipe the load generator's output straight in
//! load-generator | lagwatch-ingest --store-path /data/events
//!
//! # Replay a recorded run with a larger batch size
//! lagwatch-ingest --input run.jsonl --buffer-size 500
//! ```
//!
//! # Graceful Shutdown
//!
//! On SIGINT (Ctrl+C) the buffer is flushed before the process exits, so no
//! acknowledged operation is lost. End of input flushes the same way.

use anyhow::{Context, Result};
use clap::Parser;
use lagwatch_core::metrics::{init_metrics, start_metrics_server};
use lagwatch_core::{Config, EventStore, RocksStore};
use lagwatch_ingest::{BufferedItem, FlushReport, JsonlProducer, SourceStats, WriteBackBuffer};
use metrics::gauge;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

type SharedBuffer = Arc<WriteBackBuffer<Arc<RocksStore>>>;

/// lagwatch ingestion daemon.
#[derive(Parser, Debug)]
#[command(name = "lagwatch-ingest")]
#[command(about = "Buffer provisioning acknowledgements into the lagwatch event store")]
#[command(version)]
struct Args {
    /// Producer JSONL file ("-" or omitted reads stdin)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// RocksDB event store path (overrides LAGWATCH_STORE_PATH)
    #[arg(long)]
    store_path: Option<PathBuf>,

    /// Items buffered before a flush (overrides LAGWATCH_BUFFER_SIZE)
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Fsync every store write
    #[arg(long)]
    sync_writes: bool,

    /// Metrics HTTP server port, 0 to disable (overrides LAGWATCH_METRICS_PORT)
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Path to .env file (optional)
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lagwatch_ingest=debug")),
        )
        .init();

    let mut config = Config::from_env()?;
    if let Some(path) = &args.store_path {
        config.store_path = path.clone();
    }
    if let Some(size) = args.buffer_size {
        config.buffer_size = size;
    }
    if let Some(port) = args.metrics_port {
        config.metrics_port = port;
    }

    tracing::info!("lagwatch ingestion daemon starting...");

    if config.metrics_port > 0 {
        let handle = init_metrics();
        start_metrics_server(config.metrics_port, handle).await?;
        gauge!("ingest_running").set(1.0);
    }

    // An unreachable store is fatal at startup
    let store = Arc::new(
        RocksStore::open(&config.store_path)
            .with_context(|| format!("Failed to open event store at {:?}", config.store_path))?
            .with_sync_writes(args.sync_writes),
    );

    let buffer: SharedBuffer = Arc::new(
        WriteBackBuffer::new(Arc::clone(&store), config.buffer_size)
            .context("Failed to create write-back buffer")?,
    );

    install_shutdown_handler(Arc::clone(&buffer))?;

    let mut flushed = FlushReport::default();
    let source_stats = run(&args, &buffer, &mut flushed)?;

    tracing::info!("Input exhausted, flushing remaining items...");
    flushed.merge(buffer.flush());
    store.flush().context("Failed to flush event store")?;

    gauge!("ingest_running").set(0.0);
    print_summary(&config, &source_stats, &flushed, buffer.store().name());

    Ok(())
}

/// Feed the producer stream into the buffer.
fn run(args: &Args, buffer: &SharedBuffer, flushed: &mut FlushReport) -> Result<SourceStats> {
    let handler = |item: BufferedItem| -> lagwatch_ingest::Result<bool> {
        if let Some(report) = buffer.append(item) {
            flushed.merge(report);
        }
        Ok(true)
    };

    let stats = match args.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            tracing::info!("Reading producer records from {}", path.display());
            JsonlProducer::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?
                .process(handler)?
        }
        _ => {
            tracing::info!("Reading producer records from stdin");
            JsonlProducer::new(BufReader::new(std::io::stdin()), "stdin").process(handler)?
        }
    };

    Ok(stats)
}

/// Flush the buffer and exit on Ctrl+C.
fn install_shutdown_handler(buffer: SharedBuffer) -> Result<()> {
    ctrlc::set_handler(move || {
        tracing::info!("Shutdown signal received, flushing buffer...");
        let report = buffer.flush();
        if let Err(e) = buffer.store().flush() {
            tracing::error!("Failed to flush event store: {}", e);
        }
        tracing::info!(
            "Flushed {} items on shutdown ({} failed)",
            report.written,
            report.failed()
        );
        std::process::exit(130);
    })
    .context("Failed to set Ctrl+C handler")
}

fn print_summary(config: &Config, source: &SourceStats, flushed: &FlushReport, store: &str) {
    println!("\n══════════════════════════════════════════════════════════════════");
    println!("SUMMARY");
    println!("══════════════════════════════════════════════════════════════════\n");
    println!("Store:             {} ({})", config.store_path.display(), store);
    println!("Buffer size:       {:>12}", config.buffer_size);
    println!();
    println!("Lines read:        {:>12}", source.total_lines);
    println!("Records appended:  {:>12}", source.records);
    println!("Unparseable lines: {:>12}", source.parse_errors);
    println!();
    println!("Items attempted:   {:>12}", flushed.attempted);
    println!("Items written:     {:>12}", flushed.written);
    println!("Items failed:      {:>12}", flushed.failed());
    for (reason, count) in flushed.failure_counts() {
        println!("  - {:<16} {:>10}", reason, count);
    }
    println!();
}
