//! Construction options for a static map
//!
//! `MapOptions` is the immutable input to [`StaticMap::render`]. It can be
//! built in code or loaded from JSON using the same camelCase keys a web map
//! would take (`center`, `zoom`, `tileUrl`, `subdomains`, `size`).
//!
//! [`StaticMap::render`]: crate::core::map::StaticMap::render

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::constants::{DEFAULT_SUBDOMAINS, MAX_VIEWPORT_SIZE};
use super::geo::LngLat;
use super::map::AttachPolicy;
use crate::tiles::grid::TileOrder;
use crate::tiles::source::UrlTemplate;
use crate::{MapError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    /// Geographic center, `[lng, lat]`. Required.
    #[serde(default)]
    pub center: Option<LngLat>,
    /// Zoom level of the tile pyramid. Required.
    #[serde(default)]
    pub zoom: Option<f64>,
    /// Template with `{s}`, `{x}`, `{y}` and `{z}` placeholders. Required.
    #[serde(default)]
    pub tile_url: Option<String>,
    #[serde(default = "default_subdomains")]
    pub subdomains: String,
    /// Viewport size in pixels. When absent the surface is measured, which
    /// may be expensive (a layout read on most surfaces).
    #[serde(default)]
    pub size: Option<(f64, f64)>,
    #[serde(default)]
    pub order: TileOrder,
    #[serde(default)]
    pub attach: AttachPolicy,
}

fn default_subdomains() -> String {
    DEFAULT_SUBDOMAINS.to_string()
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: None,
            zoom: None,
            tile_url: None,
            subdomains: default_subdomains(),
            size: None,
            order: TileOrder::default(),
            attach: AttachPolicy::default(),
        }
    }
}

/// Validated view parameters, produced by [`MapOptions::validate`]
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub center: LngLat,
    pub zoom: f64,
    pub source: UrlTemplate,
}

impl MapOptions {
    /// Options with every required field set
    pub fn new(center: LngLat, zoom: f64, tile_url: impl Into<String>) -> Self {
        Self {
            center: Some(center),
            zoom: Some(zoom),
            tile_url: Some(tile_url.into()),
            ..Self::default()
        }
    }

    pub fn subdomains(mut self, subdomains: impl Into<String>) -> Self {
        self.subdomains = subdomains.into();
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn order(mut self, order: TileOrder) -> Self {
        self.order = order;
        self
    }

    pub fn attach(mut self, attach: AttachPolicy) -> Self {
        self.attach = attach;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Checks required fields and value ranges, failing fast instead of
    /// letting a missing center or zoom turn into NaN tile indices later.
    pub fn validate(&self) -> Result<View> {
        let center = self.center.ok_or(MapError::MissingConfig("center"))?;
        let zoom = self.zoom.ok_or(MapError::MissingConfig("zoom"))?;
        let tile_url = self
            .tile_url
            .as_deref()
            .ok_or(MapError::MissingConfig("tileUrl"))?;

        if !center.is_finite() {
            return Err(MapError::InvalidConfig(format!(
                "center must be finite, got [{}, {}]",
                center.lng, center.lat
            )));
        }

        if !zoom.is_finite() || zoom < 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "zoom must be a non-negative number, got {}",
                zoom
            )));
        }

        if let Some((width, height)) = self.size {
            validate_size(width, height)?;
        }

        Ok(View {
            center,
            zoom,
            source: UrlTemplate::new(tile_url, zoom).with_subdomains(&self.subdomains),
        })
    }
}

pub(crate) fn validate_size(width: f64, height: f64) -> Result<()> {
    let in_range = |side: f64| (0.0..=MAX_VIEWPORT_SIZE).contains(&side);
    if !(in_range(width) && in_range(height)) {
        return Err(MapError::InvalidConfig(format!(
            "size must be between 0 and {} pixels, got [{}, {}]",
            MAX_VIEWPORT_SIZE, width, height
        )));
    }
    Ok(())
}
