/// Inspection tool: loads a layer-record export and prints the derived
/// catalog, resolved tile URLs, or the initial tile descriptors as JSON.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use floodview_core::{
    build_catalog, parse_records, LayerRecord, StretchRange, ViewerConfig, ViewerController,
};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "inspect", about = "Inspect flood-map layer catalogs and tile URLs")]
struct Args {
    /// Viewer config JSON (FLOODVIEW_* environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the catalog derived from a record export
    Catalog {
        /// Record export (JSON array)
        #[arg(short, long)]
        records: PathBuf,
    },

    /// Print the tile URL template for a terrain layer
    TerrainUrl {
        #[arg(short, long)]
        model: String,

        #[arg(long, default_value = "terrain")]
        colormap: String,

        /// Lower end of the elevation stretch
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        min: f64,

        /// Upper end of the elevation stretch
        #[arg(long, default_value = "3000", allow_negative_numbers = true)]
        max: f64,
    },

    /// Print the tile URL template for a flood-depth layer
    FloodUrl {
        #[arg(short, long)]
        model: String,

        /// Correction dataset, e.g. hand_2000
        #[arg(long)]
        correction: String,

        /// Flood level, e.g. 5m
        #[arg(short, long)]
        level: String,

        #[arg(long, default_value = "blues")]
        colormap: String,

        /// Lower end of the depth stretch
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        min: f64,

        /// Upper end of the depth stretch
        #[arg(long, default_value = "5", allow_negative_numbers = true)]
        max: f64,

        /// Draw in a single fixed hue instead of the colormap
        #[arg(long)]
        pure_color: bool,
    },

    /// Print the tile descriptors for the initial selection
    Descriptors {
        #[arg(short, long)]
        records: PathBuf,
    },
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    let base = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ViewerConfig::from_json(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ViewerConfig::default(),
    };
    base.with_env(|key| std::env::var(key).ok())
        .context("applying FLOODVIEW_* environment")
}

fn load_records(path: &Path) -> Result<Vec<LayerRecord>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading records {}", path.display()))?;
    let records = parse_records(&json)
        .with_context(|| format!("parsing records {}", path.display()))?;
    info!(path = %path.display(), records = records.len(), "loaded layer records");
    Ok(records)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Only the URL-building commands need a tile base, so config is loaded there.
    let config_path = args.config.as_deref();

    match args.command {
        Command::Catalog { records } => {
            let records = load_records(&records)?;
            let catalog = build_catalog(&records);
            info!(
                models = catalog.model_list.len(),
                flood_models = catalog.correction_by_model_level.len(),
                "catalog built"
            );
            print_json(&catalog)?;
        }
        Command::TerrainUrl { model, colormap, min, max } => {
            let resolver = load_config(config_path)?.resolver()?;
            println!("{}", resolver.terrain_url(&model, &colormap, StretchRange::new(min, max)));
        }
        Command::FloodUrl { model, correction, level, colormap, min, max, pure_color } => {
            let resolver = load_config(config_path)?.resolver()?;
            let stretch = StretchRange::new(min, max);
            println!(
                "{}",
                resolver.flood_url(&model, &correction, &level, &colormap, stretch, pure_color)
            );
        }
        Command::Descriptors { records } => {
            let config = load_config(config_path)?;
            let records: Arc<[LayerRecord]> = load_records(&records)?.into();
            if config.basemap().is_none() {
                info!("no basemap token configured; basemap disabled");
            }
            let mut viewer = ViewerController::new(config, records)?;
            print_json(&viewer.descriptors())?;
        }
    }

    Ok(())
}
