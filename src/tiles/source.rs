use crate::core::constants::{DEFAULT_SUBDOMAINS, OPENSTREETMAP_SUBDOMAINS, OPENSTREETMAP_URL};
use crate::core::geo::TileCoord;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// URL template with `{s}`, `{x}`, `{y}` and `{z}` placeholders, bound to one zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlTemplate {
    template: String,
    zoom: f64,
    subdomains: Vec<char>,
}

impl UrlTemplate {
    pub fn new(template: impl Into<String>, zoom: f64) -> Self {
        Self {
            template: template.into(),
            zoom,
            subdomains: DEFAULT_SUBDOMAINS.chars().collect(),
        }
    }

    /// OpenStreetMap's public tile servers, balanced over `a`, `b` and `c`.
    pub fn openstreetmap(zoom: f64) -> Self {
        Self::new(OPENSTREETMAP_URL, zoom).with_subdomains(OPENSTREETMAP_SUBDOMAINS)
    }

    /// Each character of `subdomains` is one host alternative for `{s}`.
    /// An empty alphabet falls back to the default one.
    pub fn with_subdomains(mut self, subdomains: &str) -> Self {
        let subdomains = if subdomains.is_empty() {
            DEFAULT_SUBDOMAINS
        } else {
            subdomains
        };
        self.subdomains = subdomains.chars().collect();
        self
    }

    pub fn subdomains(&self) -> String {
        self.subdomains.iter().collect()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Subdomain for a tile: `|x + y| mod len`, so neighbouring tiles spread
    /// over different hosts.
    pub fn subdomain(&self, coord: TileCoord) -> Option<char> {
        if self.subdomains.is_empty() {
            return None;
        }

        let len = self.subdomains.len() as u64;
        let idx = (coord.x.wrapping_add(coord.y).unsigned_abs() % len) as usize;
        Some(self.subdomains[idx])
    }
}

impl TileSource for UrlTemplate {
    fn url(&self, coord: TileCoord) -> String {
        let subdomain = self.subdomain(coord).map(String::from).unwrap_or_default();

        // Only the first occurrence of each placeholder is substituted
        self.template
            .replacen("{s}", &subdomain, 1)
            .replacen("{x}", &coord.x.to_string(), 1)
            .replacen("{y}", &coord.y.to_string(), 1)
            .replacen("{z}", &self.zoom.to_string(), 1)
    }
}

/// Builds the URL of one tile. Pure: identical inputs always give the same string.
pub fn build_url(coord: TileCoord, zoom: f64, template: &str, subdomains: &str) -> String {
    UrlTemplate::new(template, zoom)
        .with_subdomains(subdomains)
        .url(coord)
}
