pub mod grid;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use grid::{visible_tiles, TileOrder, TileRange};
pub use loader::{HttpTileLoader, ManualTileLoader, TileLoader, TileRequest, TileResponse};
pub use source::{build_url, TileSource, UrlTemplate};

#[cfg(feature = "tokio-runtime")]
pub use loader::TokioTileLoader;
