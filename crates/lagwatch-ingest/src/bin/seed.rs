//! Synthetic data generator for lagwatch.
//!
//! Writes origin/confirmation pairs straight into the event store, shaped
//! exactly like real traffic: origin zones carry the trailing root dot,
//! confirmation zones do not, and serials come from a microsecond clock.
//!
//! # Usage
//!
//! ```bash
//! # 50 matched pairs with 10-200s propagation delay
//! lagwatch-seed --store-path ./data/events
//!
//! # 1000 pairs, 25 of them never confirmed
//! lagwatch-seed --count 1000 --unmatched 25
//! ```

use anyhow::{Context, Result, bail};
use chrono::{Duration, Local, NaiveDateTime};
use clap::Parser;
use lagwatch_core::{Config, Event, EventKind, EventStore, RocksStore, Serial};
use rand::Rng;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lagwatch-seed")]
#[command(about = "Write synthetic origin/confirmation pairs to the lagwatch event store")]
struct Args {
    /// RocksDB event store path (overrides LAGWATCH_STORE_PATH)
    #[arg(long)]
    store_path: Option<std::path::PathBuf>,

    /// Number of origin events to generate
    #[arg(long, default_value = "50")]
    count: usize,

    /// How many of the origin events get no confirmation
    #[arg(long, default_value = "0")]
    unmatched: usize,

    /// Minimum propagation delay in seconds
    #[arg(long, default_value = "10")]
    min_delay: i64,

    /// Maximum propagation delay in seconds (exclusive)
    #[arg(long, default_value = "200")]
    max_delay: i64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    if args.unmatched > args.count {
        bail!("--unmatched ({}) cannot exceed --count ({})", args.unmatched, args.count);
    }
    if args.min_delay < 0 || args.max_delay <= args.min_delay {
        bail!("delay range must satisfy 0 <= min-delay < max-delay");
    }

    let mut config = Config::from_env()?;
    if let Some(path) = args.store_path {
        config.store_path = path;
    }

    let store = RocksStore::open(&config.store_path)
        .with_context(|| format!("Failed to open event store at {:?}", config.store_path))?;

    tracing::info!("Generating {} entries", args.count);

    let mut rng = rand::thread_rng();
    let mut last_serial: Serial = 0;

    for i in 0..args.count {
        let serial = next_serial(&mut last_serial);
        let zone = format!("zone{i}.com.");
        let origin_at = Local::now().naive_local();

        write_event(&store, EventKind::Origin, &zone, serial, origin_at)?;

        // The last `unmatched` origins never get confirmed
        if i < args.count - args.unmatched {
            let delay = Duration::seconds(rng.gen_range(args.min_delay..args.max_delay));
            write_event(&store, EventKind::Confirmation, &zone, serial, origin_at + delay)?;
        }
    }

    store.flush()?;

    println!(
        "Wrote {} origin and {} confirmation entries to {}",
        args.count,
        args.count - args.unmatched,
        config.store_path.display()
    );

    Ok(())
}

/// Microsecond-clock serial, bumped when the clock hasn't advanced.
fn next_serial(last: &mut Serial) -> Serial {
    let now = Local::now().timestamp_micros().max(0) as Serial;
    *last = now.max(*last + 1);
    *last
}

fn write_event(
    store: &RocksStore,
    kind: EventKind,
    zone: &str,
    serial: Serial,
    timestamp: NaiveDateTime,
) -> Result<()> {
    let event = Event::new(kind, zone, serial, timestamp);
    let (key, value) = kind.codec().encode(&event);
    store
        .set(&key, &value)
        .with_context(|| format!("Failed to write {key}"))
}
