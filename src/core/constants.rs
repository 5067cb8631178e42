//! Core constants shared by the projection, tile grid and URL builder.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Spherical Mercator Earth radius in meters (EPSG:3857).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude bound beyond which spherical Mercator is undefined.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Subdomain alphabet used for `{s}` when none is configured,
/// or when the configured alphabet is empty.
pub const DEFAULT_SUBDOMAINS: &str = "0123";

/// Largest accepted viewport side in pixels, which keeps tile ranges countable.
pub const MAX_VIEWPORT_SIZE: f64 = 65536.0;

/// OpenStreetMap's public tile servers.
pub const OPENSTREETMAP_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OPENSTREETMAP_SUBDOMAINS: &str = "abc";
