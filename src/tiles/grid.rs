//! Visible tile enumeration
//!
//! Turns a pixel center and viewport size into the half-open range of tile
//! indices covering the viewport, then orders them for loading.

use serde::{Deserialize, Serialize};

use crate::core::constants::TILE_SIZE;
use crate::core::geo::{Point, TileCoord};

/// Order in which visible tiles are handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileOrder {
    /// Rows top to bottom, columns left to right
    RowMajor,
    /// Ascending distance from the center tile, so the middle of the map
    /// starts loading first. Ties keep row-major order.
    #[default]
    CenterOut,
}

/// Half-open range of tile indices: `min.x <= x < max.x`, `min.y <= y < max.y`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub min: TileCoord,
    pub max: TileCoord,
}

impl TileRange {
    /// Range of tiles covering a `size` viewport centered on `pixel_center`
    pub fn covering(pixel_center: Point, size: (f64, f64)) -> Self {
        let tile_size = TILE_SIZE as f64;
        let half_size = Point::new(size.0 / 2.0, size.1 / 2.0);

        let min = pixel_center.subtract(&half_size).divide(tile_size).floor();
        let max = pixel_center.add(&half_size).divide(tile_size).ceil();

        Self {
            min: TileCoord::new(min.x as i64, min.y as i64),
            max: TileCoord::new(max.x as i64, max.y as i64),
        }
    }

    pub fn width(&self) -> u64 {
        self.max.x.saturating_sub(self.min.x).max(0) as u64
    }

    pub fn height(&self) -> u64 {
        self.max.y.saturating_sub(self.min.y).max(0) as u64
    }

    pub fn len(&self) -> usize {
        self.width().saturating_mul(self.height()) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        (self.min.x..self.max.x).contains(&coord.x) && (self.min.y..self.max.y).contains(&coord.y)
    }

    /// Tile nearest the middle of the range, rounding toward the northwest
    pub fn center(&self) -> TileCoord {
        let middle = |min: i64, max: i64| {
            min + max.saturating_sub(1).saturating_sub(min).div_euclid(2)
        };
        TileCoord::new(middle(self.min.x, self.max.x), middle(self.min.y, self.max.y))
    }

    /// Row-major iteration over every tile in the range
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> {
        let (min, max) = (self.min, self.max);
        (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| TileCoord::new(x, y)))
    }

    /// Every tile in the range, in the requested order
    pub fn ordered(&self, order: TileOrder) -> Vec<TileCoord> {
        let mut tiles: Vec<TileCoord> = self.iter().collect();

        if order == TileOrder::CenterOut {
            let center = self.center();
            // sort_by is stable, so equidistant tiles stay row-major
            tiles.sort_by(|a, b| a.distance_to(&center).total_cmp(&b.distance_to(&center)));
        }

        tiles
    }
}

/// Tiles covering a `size` viewport centered on `pixel_center`.
///
/// Indices are never clamped or wrapped; tiles above the pole or past the
/// antimeridian are returned as-is.
pub fn visible_tiles(pixel_center: Point, size: (f64, f64), order: TileOrder) -> Vec<TileCoord> {
    TileRange::covering(pixel_center, size).ordered(order)
}
