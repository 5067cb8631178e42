use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::constants::{EARTH_RADIUS, MAX_LATITUDE, TILE_SIZE};

/// Represents a geographical coordinate with longitude and latitude in degrees.
///
/// Serialized as a `[lng, lat]` pair, the usual web-map order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    /// Creates a new LngLat coordinate
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Clamps latitude to the range spherical Mercator can represent
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    /// Projects to spherical Mercator meters (EPSG:3857).
    ///
    /// Latitude is clamped first, so poles and beyond collapse onto the
    /// projection boundary. Longitude is not wrapped.
    pub fn project(&self) -> Point {
        let d = PI / 180.0;
        let lat = Self::clamp_lat(self.lat);
        let sin = (lat * d).sin();

        Point::new(
            EARTH_RADIUS * self.lng * d,
            EARTH_RADIUS * ((1.0 + sin) / (1.0 - sin)).ln() / 2.0,
        )
    }

    /// Converts to world pixel space at `zoom`.
    ///
    /// The whole world maps onto a `256 * 2^zoom` pixel square with the origin
    /// at the northwest corner. Fractional zooms are allowed.
    pub fn to_pixel(&self, zoom: f64) -> Point {
        let projected = self.project();
        let scale = TILE_SIZE as f64 * 2_f64.powf(zoom);
        let k = 0.5 / (PI * EARTH_RADIUS);

        Point::new(
            scale * (k * projected.x + 0.5),
            scale * (-k * projected.y + 0.5),
        )
    }
}

impl Default for LngLat {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self::new(lng, lat)
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(lng_lat: LngLat) -> Self {
        [lng_lat.lng, lng_lat.lat]
    }
}

/// Represents a point in world pixel or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn divide(&self, scalar: f64) -> Point {
        Point::new(self.x / scalar, self.y / scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    pub fn ceil(&self) -> Point {
        Point::new(self.x.ceil(), self.y.ceil())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Column/row of a tile in the slippy map pyramid.
///
/// Signed on purpose: indices left of the antimeridian or above the pole are
/// carried through untouched and left for the tile server to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i64,
    pub y: i64,
}

impl TileCoord {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Top-left corner of the tile in world pixel space
    pub fn origin(&self) -> Point {
        let size = TILE_SIZE as f64;
        Point::new(self.x as f64 * size, self.y as f64 * size)
    }

    /// Euclidean distance in tile units, used for center-out ordering
    pub fn distance_to(&self, other: &TileCoord) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_world_center_at_zoom_zero() {
        let pixel = LngLat::new(0.0, 0.0).to_pixel(0.0);
        assert!(approx(pixel.x, 128.0));
        assert!(approx(pixel.y, 128.0));
    }

    #[test]
    fn test_latitude_is_clamped_before_projection() {
        let boundary = LngLat::new(10.0, MAX_LATITUDE).project();
        let beyond = LngLat::new(10.0, 89.9).project();
        assert_eq!(boundary, beyond);

        let south = LngLat::new(10.0, -MAX_LATITUDE).project();
        let pole = LngLat::new(10.0, -90.0).project();
        assert_eq!(south, pole);
        assert!(pole.y.is_finite());
    }

    #[test]
    fn test_mercator_boundary_maps_to_world_edge() {
        let north = LngLat::new(-180.0, MAX_LATITUDE).to_pixel(0.0);
        assert!(north.x.abs() < 1e-6);
        assert!(north.y.abs() < 1e-3);

        let south = LngLat::new(180.0, -MAX_LATITUDE).to_pixel(0.0);
        assert!(approx(south.x, 256.0));
        assert!((south.y - 256.0).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_doubles_pixel_distance() {
        let a = LngLat::new(-74.0060, 40.7128);
        let b = LngLat::new(2.3522, 48.8566);

        for zoom in 0..6 {
            let z = zoom as f64;
            let near = a.to_pixel(z).distance_to(&b.to_pixel(z));
            let far = a.to_pixel(z + 1.0).distance_to(&b.to_pixel(z + 1.0));
            assert!((far - 2.0 * near).abs() < 1e-6 * far.max(1.0));
        }
    }

    #[test]
    fn test_longitude_is_not_wrapped() {
        let east = LngLat::new(540.0, 0.0).to_pixel(0.0);
        assert!(approx(east.x, 512.0));
    }

    #[test]
    fn test_lng_lat_serializes_as_pair() {
        let json = serde_json::to_string(&LngLat::new(30.5, 50.25)).unwrap();
        assert_eq!(json, "[30.5,50.25]");

        let parsed: LngLat = serde_json::from_str("[-0.1278, 51.5074]").unwrap();
        assert_eq!(parsed, LngLat::new(-0.1278, 51.5074));
    }

    #[test]
    fn test_tile_origin() {
        assert_eq!(TileCoord::new(3, -1).origin(), Point::new(768.0, -256.0));
        assert_eq!(TileCoord::new(0, 0).origin(), Point::default());
    }
}
