pub mod surface;

#[cfg(feature = "render")]
pub mod raster;

// Re-export main types
pub use surface::{MemorySurface, Surface, TileElement};

#[cfg(feature = "render")]
pub use raster::RasterSurface;
