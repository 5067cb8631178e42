use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tinymap::prelude::*;

const DEFAULT_SIZE: (u32, u32) = (800, 600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LoaderKind {
    /// One blocking request per thread
    Threads,
    /// Async requests on a tokio runtime
    Tokio,
}

/// Render a static slippy map to an image
#[derive(Debug, Parser)]
#[command(name = "tinymap-app", version, about)]
struct Args {
    /// JSON options file (center, zoom, tileUrl, subdomains, size, order, attach)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named location: san-francisco, new-york, london, tokyo, sydney, cape-town
    #[arg(long)]
    preset: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    lng: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long)]
    zoom: Option<f64>,

    /// Tile URL template with {s}, {x}, {y} and {z} placeholders
    #[arg(long)]
    tile_url: Option<String>,

    #[arg(long)]
    subdomains: Option<String>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Request tiles row by row instead of center-out
    #[arg(long)]
    row_major: bool,

    #[arg(long, value_enum, default_value_t = LoaderKind::Threads)]
    loader: LoaderKind,

    /// Give up on tiles that have not arrived after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[arg(short, long, default_value = "map.png")]
    output: PathBuf,
}

fn preset(name: &str) -> Option<(LngLat, f64)> {
    let presets = [
        ("san-francisco", LngLat::new(-122.4194, 37.7749), 12.0),
        ("new-york", LngLat::new(-74.0060, 40.7128), 11.0),
        ("london", LngLat::new(-0.1278, 51.5074), 11.0),
        ("tokyo", LngLat::new(139.6503, 35.6762), 11.0),
        ("sydney", LngLat::new(151.2093, -33.8688), 11.0),
        ("cape-town", LngLat::new(18.4241, -33.9249), 11.0),
    ];

    presets
        .iter()
        .find(|(preset, _, _)| *preset == name)
        .map(|(_, center, zoom)| (*center, *zoom))
}

/// Config file first, then preset, then individual flags
fn build_options(args: &Args) -> Result<MapOptions> {
    let mut options = match &args.config {
        Some(path) => MapOptions::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => MapOptions::default(),
    };

    if let Some(name) = &args.preset {
        let (center, zoom) =
            preset(name).with_context(|| format!("unknown preset '{}'", name))?;
        options.center = Some(center);
        options.zoom = Some(zoom);
    }

    if args.lng.is_some() || args.lat.is_some() {
        let current = options.center.unwrap_or_default();
        options.center = Some(LngLat::new(
            args.lng.unwrap_or(current.lng),
            args.lat.unwrap_or(current.lat),
        ));
    }

    if let Some(zoom) = args.zoom {
        options.zoom = Some(zoom);
    }

    if let Some(tile_url) = &args.tile_url {
        options.tile_url = Some(tile_url.clone());
    }

    if let Some(subdomains) = &args.subdomains {
        options.subdomains = subdomains.clone();
    }

    if options.tile_url.is_none() {
        let osm = UrlTemplate::openstreetmap(options.zoom.unwrap_or_default());
        options.tile_url = Some(osm.template().to_string());
        if args.subdomains.is_none() {
            options.subdomains = osm.subdomains();
        }
    }

    if args.row_major {
        options.order = TileOrder::RowMajor;
    }

    Ok(options)
}

/// Canvas size: flags, then the configured viewport size, then the default
fn canvas_size(args: &Args, options: &MapOptions) -> (u32, u32) {
    let (config_w, config_h) = options
        .size
        .map(|(w, h)| (w.round() as u32, h.round() as u32))
        .unwrap_or(DEFAULT_SIZE);

    (args.width.unwrap_or(config_w), args.height.unwrap_or(config_h))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut options = build_options(&args)?;
    let (width, height) = canvas_size(&args, &options);

    // Explicit dimensions win over the configured viewport; the map measures the canvas
    if args.width.is_some() || args.height.is_some() {
        options.size = None;
    }

    let surface = RasterSurface::new(width, height);
    let timeout = Duration::from_secs(args.timeout_secs);

    let map = match args.loader {
        LoaderKind::Threads => {
            let mut map = StaticMap::render(options, surface, &HttpTileLoader::new())?;
            map.wait_for_tiles(timeout);
            map
        }
        LoaderKind::Tokio => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            let loader = TokioTileLoader::new(runtime.handle().clone());
            let mut map = StaticMap::render(options, surface, &loader)?;
            map.wait_for_tiles(timeout);
            runtime.shutdown_background();
            map
        }
    };

    let requested = map.tiles().len();
    let missing = map.pending();
    let surface = map.into_surface();
    let drawn = surface.child_count();

    surface
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} ({}x{}): {} of {} tiles drawn, {} still loading",
        args.output.display(),
        width,
        height,
        drawn,
        requested,
        missing
    );

    if drawn < requested {
        log::warn!("{} tiles failed or timed out", requested - drawn);
    }

    Ok(())
}
