//! mileage - Vehicle fuel statistics with a recomputing cache

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mileage_core::cache::CACHE_FILE;
use mileage_core::models::VehicleId;
use mileage_core::{
    CacheStore, MemoryRecordSource, RecordSource, Selection, StatsConfig, StatsController,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mileage",
    version,
    about = "Vehicle fuel statistics with a recomputing cache",
    long_about = "Computes fuel economy, distance, fuel, cost and price statistics for a vehicle\n\
                  from its fill-up records and keeps them in an on-disk cache.\n\
                  \n\
                  Cached statistics are served immediately; missing or invalidated ones are\n\
                  recomputed in the background and written back as they finish.\n\
                  \n\
                  Examples:\n\
                    mileage vehicles --data records.json       # List vehicles\n\
                    mileage stats 1 --data records.json        # Statistics for vehicle 1\n\
                    mileage stats 1 --refresh                  # Invalidate and recompute\n\
                    mileage stats 1 --json                     # JSON output\n\
                    mileage cache-info                         # Cache summary\n\
                    mileage clear-cache                        # Delete the cache\n\
                  \n\
                  Environment Variables:\n\
                    MILEAGE_DATA                               # Record file (JSON)\n\
                    MILEAGE_CACHE_DIR                          # Override cache directory\n\
                    MILEAGE_NO_COLOR                           # Disable ANSI colors\n\
                    RUST_LOG                                   # Log filter (default: warn)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Record file with vehicles and fill-ups
    #[arg(long, global = true, env = "MILEAGE_DATA")]
    data: Option<PathBuf>,

    /// Cache directory (default: <user cache dir>/mileage)
    #[arg(long, global = true, env = "MILEAGE_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "MILEAGE_NO_COLOR")]
    no_color: bool,

    /// Debug logging for mileage crates
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print statistics for a vehicle
    Stats {
        /// Vehicle id
        vehicle_id: i64,
        /// Invalidate cached values and recompute everything
        #[arg(long)]
        refresh: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List vehicles in the record file
    Vehicles {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show cache location and entry counts
    CacheInfo,
    /// Delete the statistics cache and exit
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cache_dir = cli
        .cache_dir
        .or_else(|| dirs::cache_dir().map(|d: PathBuf| d.join("mileage")))
        .context("Could not determine cache directory")?;
    debug!(cache_dir = %cache_dir.display(), "Using cache directory");
    let no_color = cli.no_color;

    match cli.command {
        Command::Stats {
            vehicle_id,
            refresh,
            json,
        } => {
            let data = require_data(cli.data)?;
            run_stats(
                cache_dir,
                &data,
                VehicleId::new(vehicle_id),
                refresh,
                json,
                no_color,
            )
            .await?;
        }
        Command::Vehicles { json } => {
            let data = require_data(cli.data)?;
            run_vehicles(&data, json, no_color)?;
        }
        Command::CacheInfo => {
            run_cache_info(&cache_dir)?;
        }
        Command::ClearCache => {
            run_clear_cache(&cache_dir)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "mileage=debug,mileage_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn require_data(data: Option<PathBuf>) -> Result<PathBuf> {
    data.context("No record file given (use --data or MILEAGE_DATA)")
}

fn load_records(data: &Path) -> Result<MemoryRecordSource> {
    MemoryRecordSource::from_json_file(data)
        .with_context(|| format!("Failed to load records from {}", data.display()))
}

async fn run_stats(
    cache_dir: PathBuf,
    data: &Path,
    vehicle_id: VehicleId,
    refresh: bool,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let records = load_records(data)?;
    let vehicles = records.vehicles()?;
    let vehicle = cli::find_vehicle(&vehicles, vehicle_id)?.clone();

    let config = StatsConfig {
        cache_dir: Some(cache_dir),
        ..StatsConfig::default()
    };
    let controller = StatsController::open(&config, records.into_shared())
        .context("Failed to open statistics cache")?;

    let selection = controller.select_entity(vehicle_id)?;
    if refresh {
        controller.refresh()?;
    }

    if selection != Selection::CacheComplete || refresh {
        if let Some(job) = controller.current_job() {
            let status = job.wait().await;
            if !json {
                eprintln!(
                    "{}",
                    cli::format_job_summary(status, job.progress(), job.error().as_deref())
                );
            }
        }
    }

    let rows = controller.display_rows()?;
    println!(
        "{}",
        cli::format_statistics(&vehicle, &rows, controller.registry().len(), json, no_color)
    );

    Ok(())
}

fn run_vehicles(data: &Path, json: bool, no_color: bool) -> Result<()> {
    let records = load_records(data)?;
    let vehicles = records.vehicles()?;
    println!("{}", cli::format_vehicle_table(&vehicles, json, no_color));
    Ok(())
}

fn run_cache_info(cache_dir: &Path) -> Result<()> {
    let cache_path = cache_dir.join(CACHE_FILE);
    if !cache_path.exists() {
        println!("No cache at: {}", cache_path.display());
        return Ok(());
    }

    let size_bytes = std::fs::metadata(&cache_path).ok().map(|m| m.len());
    let store = CacheStore::open(cache_dir).context("Failed to open statistics cache")?;
    let stats = store.stats()?;

    println!(
        "{}",
        cli::format_cache_info(&stats, &cache_path.display().to_string(), size_bytes)
    );
    Ok(())
}

fn run_clear_cache(cache_dir: &Path) -> Result<()> {
    let cache_path = cache_dir.join(CACHE_FILE);

    if !cache_path.exists() {
        println!("Cache not found at: {}", cache_path.display());
        println!("   Nothing to clear.");
        return Ok(());
    }

    let size_bytes = std::fs::metadata(&cache_path)
        .with_context(|| format!("Failed to read cache metadata: {}", cache_path.display()))?
        .len();

    std::fs::remove_file(&cache_path)
        .with_context(|| format!("Failed to delete cache: {}", cache_path.display()))?;

    // WAL side files
    for suffix in ["-wal", "-shm"] {
        let side = cache_dir.join(format!("{}{}", CACHE_FILE, suffix));
        if side.exists() {
            let _ = std::fs::remove_file(&side);
        }
    }

    println!("Cache cleared");
    println!("   Location: {}", cache_path.display());
    println!("   Freed: {}", cli::format_size(size_bytes));
    println!();
    println!("Statistics will be recomputed on next use.");

    Ok(())
}
