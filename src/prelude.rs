//! Prelude module for common tinymap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tinymap::prelude::*;`

pub use crate::core::{
    config::MapOptions,
    geo::{LngLat, Point, TileCoord},
    map::{AttachPolicy, StaticMap},
};

pub use crate::rendering::surface::{MemorySurface, Surface, TileElement};

#[cfg(feature = "render")]
pub use crate::rendering::raster::RasterSurface;

pub use crate::tiles::{
    grid::{visible_tiles, TileOrder, TileRange},
    loader::{HttpTileLoader, ManualTileLoader, TileLoader, TileRequest, TileResponse},
    source::{build_url, TileSource, UrlTemplate},
};

#[cfg(feature = "tokio-runtime")]
pub use crate::tiles::loader::TokioTileLoader;

pub use crate::{MapError, Result};
