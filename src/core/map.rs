//! Static map instance
//!
//! A [`StaticMap`] is rendered once: it projects the center, enumerates the
//! visible tiles, places one element per tile and asks the loader for its
//! content. Afterwards the only mutation is [`StaticMap::remove`].
//!
//! Loads complete asynchronously. Completions queue up on a channel and are
//! applied to the surface by [`StaticMap::process_loaded_tiles`] (or
//! [`StaticMap::wait_for_tiles`]) on the thread owning the map, so the
//! surface itself is never shared.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::{validate_size, MapOptions, View};
use super::geo::{Point, TileCoord};
use crate::rendering::surface::{Surface, TileElement};
use crate::tiles::grid::visible_tiles;
use crate::tiles::loader::{TileLoader, TileRequest, TileResponse};
use crate::tiles::source::TileSource;
use crate::Result;

/// When a tile element is attached to the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachPolicy {
    /// Attach right away; content fills in when the load completes and a
    /// failed load leaves an empty element behind.
    Immediate,
    /// Attach only once the load succeeds and the map is still alive.
    /// No half-loaded or broken tiles are ever visible.
    #[default]
    OnLoad,
}

#[derive(Debug)]
pub struct StaticMap<S: Surface> {
    options: MapOptions,
    view: View,
    surface: S,
    size: (f64, f64),
    pixel_center: Point,
    tiles: Vec<TileCoord>,
    /// Loads not yet completed. `Some` holds an element waiting to be
    /// attached, `None` marks one already on the surface.
    in_flight: HashMap<TileCoord, Option<TileElement>>,
    removed: Arc<AtomicBool>,
    completions: Receiver<TileResponse>,
}

impl<S: Surface> StaticMap<S> {
    /// Render a map onto `surface`, fetching tiles through `loader`.
    ///
    /// Fails fast when required options are missing or out of range. Without
    /// an explicit size the surface is measured once.
    pub fn render(options: MapOptions, mut surface: S, loader: &dyn TileLoader) -> Result<Self> {
        let view = options.validate()?;

        surface.prepare();

        let size = match options.size {
            Some(size) => size,
            None => {
                let measured = surface.measure();
                validate_size(measured.0, measured.1)?;
                measured
            }
        };

        let pixel_center = view.center.to_pixel(view.zoom);
        let tiles = visible_tiles(pixel_center, size, options.order);
        let half_size = Point::new(size.0 / 2.0, size.1 / 2.0);

        log::info!(
            "rendering {} tiles around [{}, {}] at zoom {} ({}x{} px)",
            tiles.len(),
            view.center.lng,
            view.center.lat,
            view.zoom,
            size.0,
            size.1
        );

        let (tx, completions) = unbounded();
        let removed = Arc::new(AtomicBool::new(false));
        let mut in_flight = HashMap::with_capacity(tiles.len());

        for &coord in &tiles {
            let offset = half_size
                .add(&coord.origin())
                .subtract(&pixel_center)
                .floor();
            let url = view.source.url(coord);
            let element = TileElement::new(coord, offset.x as i64, offset.y as i64, url.clone());

            let slot = match options.attach {
                AttachPolicy::Immediate => {
                    if let Err(e) = surface.append(element) {
                        log::warn!("failed to attach tile {:?}: {}", coord, e);
                    }
                    None
                }
                AttachPolicy::OnLoad => Some(element),
            };
            in_flight.insert(coord, slot);

            log::debug!("requesting tile {:?} at ({}, {}): {}", coord, offset.x, offset.y, url);
            loader.load(TileRequest::new(coord, url, Arc::clone(&removed)), tx.clone());
        }

        Ok(Self {
            options,
            view,
            surface,
            size,
            pixel_center,
            tiles,
            in_flight,
            removed,
            completions,
        })
    }

    /// Apply every load that has completed so far, without blocking.
    /// Returns how many tiles were attached or filled.
    pub fn process_loaded_tiles(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(response) = self.completions.try_recv() {
            if self.apply(response) {
                handled += 1;
            }
        }
        handled
    }

    /// Block until every initiated load has completed or `timeout` elapses,
    /// applying completions as they arrive. Returns how many tiles were
    /// attached or filled.
    pub fn wait_for_tiles(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut handled = 0;

        while !self.is_removed() && !self.in_flight.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completions.recv_timeout(remaining) {
                Ok(response) => {
                    if self.apply(response) {
                        handled += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("timed out with {} tiles still loading", self.in_flight.len());
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("loader hung up with {} tiles unanswered", self.in_flight.len());
                    break;
                }
            }
        }

        handled
    }

    fn apply(&mut self, response: TileResponse) -> bool {
        // Late arrivals after removal must not touch the surface
        if self.is_removed() {
            return false;
        }

        let Some(slot) = self.in_flight.remove(&response.coord) else {
            log::debug!("ignoring unexpected tile {:?}", response.coord);
            return false;
        };

        let data = match response.data {
            Ok(data) => data,
            Err(e) => {
                log::warn!("tile {:?} failed to load: {}", response.coord, e);
                return false;
            }
        };

        let result = match slot {
            Some(mut element) => {
                element.data = Some(data);
                self.surface.append(element)
            }
            None => self.surface.fill(response.coord, data),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("failed to draw tile {:?}: {}", response.coord, e);
                false
            }
        }
    }

    /// Detach every tile and mark the map removed. Idempotent; loads that
    /// complete afterwards are discarded.
    pub fn remove(&mut self) {
        if self.removed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.surface.clear();
        self.in_flight.clear();
        log::info!("map removed");
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Loads initiated but not yet completed
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Enumerated tiles, in the order their loads were initiated
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    pub fn pixel_center(&self) -> Point {
        self.pixel_center
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LngLat;
    use crate::rendering::surface::MemorySurface;
    use crate::tiles::grid::TileOrder;
    use crate::tiles::loader::ManualTileLoader;
    use crate::MapError;

    const TEMPLATE: &str = "https://tile{s}.example.com/{z}/{x}/{y}.png";

    fn world_options() -> MapOptions {
        MapOptions::new(LngLat::new(0.0, 0.0), 1.0, TEMPLATE).size(256.0, 256.0)
    }

    #[test]
    fn test_render_places_tiles() {
        let loader = ManualTileLoader::new();
        let map = StaticMap::render(
            world_options().order(TileOrder::RowMajor),
            MemorySurface::new(0.0, 0.0),
            &loader,
        )
        .unwrap();

        assert!(map.surface().is_prepared());
        assert_eq!(map.surface().measurements(), 0);
        assert_eq!(map.pixel_center(), Point::new(256.0, 256.0));
        assert_eq!(map.pending(), 4);
        assert_eq!(map.surface().child_count(), 0);

        let urls: Vec<_> = loader.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://tile0.example.com/1/0/0.png",
                "https://tile1.example.com/1/1/0.png",
                "https://tile1.example.com/1/0/1.png",
                "https://tile2.example.com/1/1/1.png",
            ]
        );
    }

    #[test]
    fn test_center_out_requests_center_first() {
        let loader = ManualTileLoader::new();
        let options = MapOptions::new(LngLat::new(0.0, 0.0), 3.0, TEMPLATE).size(800.0, 600.0);
        let map = StaticMap::render(options, MemorySurface::new(0.0, 0.0), &loader).unwrap();

        let requests = loader.requests();
        assert_eq!(requests.len(), map.tiles().len());
        assert_eq!(requests[0].coord, map.tiles()[0]);
        // 1024px center, 800x600 viewport: range x 2..6, y 2..6, center (3, 3)
        assert_eq!(requests[0].coord, TileCoord::new(3, 3));
    }

    #[test]
    fn test_deferred_attachment_and_offsets() {
        let loader = ManualTileLoader::new();
        let mut map =
            StaticMap::render(world_options(), MemorySurface::new(0.0, 0.0), &loader).unwrap();

        assert!(loader.complete(TileCoord::new(1, 1), vec![1]));
        assert_eq!(map.surface().child_count(), 0);
        assert_eq!(map.process_loaded_tiles(), 1);
        assert_eq!(map.surface().child_count(), 1);

        let tile = map.surface().child(TileCoord::new(1, 1)).unwrap();
        assert_eq!((tile.left, tile.top), (128, 128));
        assert_eq!((tile.width, tile.height), (256, 256));
        assert_eq!(tile.data, Some(vec![1]));

        assert!(loader.fail(TileCoord::new(0, 0), "404"));
        assert_eq!(map.process_loaded_tiles(), 0);
        assert!(map.surface().child(TileCoord::new(0, 0)).is_none());
        assert_eq!(map.pending(), 2);

        loader.complete_all(&[7]);
        assert_eq!(map.wait_for_tiles(Duration::from_secs(1)), 2);
        assert_eq!(map.surface().child_count(), 3);

        let top_right = map.surface().child(TileCoord::new(1, 0)).unwrap();
        assert_eq!((top_right.left, top_right.top), (128, -128));
    }

    #[test]
    fn test_immediate_attachment() {
        let loader = ManualTileLoader::new();
        let mut map = StaticMap::render(
            world_options().attach(AttachPolicy::Immediate),
            MemorySurface::new(0.0, 0.0),
            &loader,
        )
        .unwrap();

        assert_eq!(map.surface().child_count(), 4);
        assert!(map.surface().children().iter().all(|c| !c.is_loaded()));

        loader.complete(TileCoord::new(0, 1), vec![3]);
        loader.fail(TileCoord::new(1, 0), "timeout");
        assert_eq!(map.process_loaded_tiles(), 1);

        assert!(map.surface().child(TileCoord::new(0, 1)).unwrap().is_loaded());
        assert!(!map.surface().child(TileCoord::new(1, 0)).unwrap().is_loaded());
        assert_eq!(map.surface().child_count(), 4);
    }

    #[test]
    fn test_measures_surface_without_size() {
        let loader = ManualTileLoader::new();
        let options = MapOptions::new(LngLat::new(0.0, 0.0), 1.0, TEMPLATE);
        let map = StaticMap::render(options, MemorySurface::new(256.0, 256.0), &loader).unwrap();

        assert_eq!(map.surface().measurements(), 1);
        assert_eq!(map.size(), (256.0, 256.0));
        assert_eq!(map.tiles().len(), 4);
    }

    #[test]
    fn test_remove_is_idempotent_and_final() {
        let loader = ManualTileLoader::new();
        let mut map =
            StaticMap::render(world_options(), MemorySurface::new(0.0, 0.0), &loader).unwrap();

        loader.complete(TileCoord::new(0, 0), vec![0]);
        map.process_loaded_tiles();
        assert_eq!(map.surface().child_count(), 1);

        map.remove();
        assert!(map.is_removed());
        assert_eq!(map.surface().child_count(), 0);
        assert_eq!(map.pending(), 0);

        map.remove();
        assert!(map.is_removed());

        // Late completions are swallowed by the loader or ignored by the map
        loader.complete_all(&[1]);
        assert_eq!(map.process_loaded_tiles(), 0);
        assert_eq!(map.wait_for_tiles(Duration::from_millis(10)), 0);
        assert_eq!(map.surface().child_count(), 0);
    }

    #[test]
    fn test_missing_config_fails_before_touching_surface() {
        let loader = ManualTileLoader::new();
        let mut options = world_options();
        options.center = None;

        let err = StaticMap::render(options, MemorySurface::new(10.0, 10.0), &loader).unwrap_err();
        assert!(matches!(err, MapError::MissingConfig("center")));
        assert_eq!(loader.outstanding(), 0);
    }

    #[test]
    fn test_wait_for_tiles_times_out() {
        let loader = ManualTileLoader::new();
        let mut map =
            StaticMap::render(world_options(), MemorySurface::new(0.0, 0.0), &loader).unwrap();

        assert_eq!(map.wait_for_tiles(Duration::from_millis(20)), 0);
        assert_eq!(map.pending(), 4);
    }
}
