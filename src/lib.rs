//! # tinymap
//!
//! A tiny, non-interactive slippy map.
//!
//! Given a geographic center, a zoom level and a tile URL template, tinymap
//! projects the center with spherical Mercator, works out which 256px tiles
//! cover the viewport and places one absolutely-positioned element per tile
//! on a [`Surface`]. Tiles load asynchronously through a [`TileLoader`],
//! nearest to the center first. The only thing a rendered map can do
//! afterwards is [`StaticMap::remove`].
//!
//! ```no_run
//! use tinymap::prelude::*;
//!
//! let template = "https://tile{s}.example.com/{z}/{x}/{y}.png";
//! let options = MapOptions::new(LngLat::new(82.92, 55.03), 12.0, template).size(640.0, 480.0);
//! let surface = MemorySurface::new(640.0, 480.0);
//! let mut map = StaticMap::render(options, surface, &HttpTileLoader::new())?;
//! map.wait_for_tiles(std::time::Duration::from_secs(10));
//! map.remove();
//! # Ok::<(), tinymap::MapError>(())
//! ```

pub mod core;
pub mod prelude;
pub mod rendering;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::MapOptions,
    geo::{LngLat, Point, TileCoord},
    map::{AttachPolicy, StaticMap},
};

pub use rendering::surface::{MemorySurface, Surface, TileElement};

#[cfg(feature = "render")]
pub use rendering::raster::RasterSurface;

pub use tiles::{
    grid::{visible_tiles, TileOrder, TileRange},
    loader::{HttpTileLoader, ManualTileLoader, TileLoader},
    source::{build_url, TileSource, UrlTemplate},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tile server error: {0}")]
    Http(String),

    #[cfg(feature = "render")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Error type alias for convenience
pub type Error = MapError;
