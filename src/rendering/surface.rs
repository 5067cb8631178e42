//! Rendering surface abstraction
//!
//! A surface is the rectangular container tiles are placed into. It knows its
//! own pixel size and holds absolutely-positioned tile elements; everything
//! outside its bounds is clipped.

use crate::core::constants::TILE_SIZE;
use crate::core::geo::TileCoord;
use crate::Result;

/// One positioned tile, offset relative to the surface's top-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct TileElement {
    pub coord: TileCoord,
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
    pub url: String,
    /// Loaded tile bytes; `None` until the load completes
    pub data: Option<Vec<u8>>,
}

impl TileElement {
    pub fn new(coord: TileCoord, left: i64, top: i64, url: impl Into<String>) -> Self {
        Self {
            coord,
            left,
            top,
            width: TILE_SIZE,
            height: TILE_SIZE,
            url: url.into(),
            data: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// Whether any part of the element falls inside a `width` x `height` surface
    pub fn intersects(&self, width: f64, height: f64) -> bool {
        let (left, top) = (self.left as f64, self.top as f64);
        left < width
            && top < height
            && left + self.width as f64 > 0.0
            && top + self.height as f64 > 0.0
    }
}

/// The container a map draws into
pub trait Surface {
    /// Set up the surface for absolutely-positioned children with clipped
    /// overflow. Called once before any tile is appended.
    fn prepare(&mut self);

    /// Current size in pixels. May be expensive (a layout read on most
    /// surfaces); callers that know the size should pass it in instead.
    fn measure(&self) -> (f64, f64);

    /// Attach a tile element
    fn append(&mut self, element: TileElement) -> Result<()>;

    /// Content for an already-attached element has arrived
    fn fill(&mut self, coord: TileCoord, data: Vec<u8>) -> Result<()>;

    /// Detach every child
    fn clear(&mut self);

    fn child_count(&self) -> usize;
}

/// Surface that keeps elements in memory without drawing anything
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    width: f64,
    height: f64,
    prepared: bool,
    measurements: std::cell::Cell<usize>,
    children: Vec<TileElement>,
}

impl MemorySurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn children(&self) -> &[TileElement] {
        &self.children
    }

    pub fn child(&self, coord: TileCoord) -> Option<&TileElement> {
        self.children.iter().find(|child| child.coord == coord)
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// How many times the size was measured
    pub fn measurements(&self) -> usize {
        self.measurements.get()
    }
}

impl Surface for MemorySurface {
    fn prepare(&mut self) {
        self.prepared = true;
    }

    fn measure(&self) -> (f64, f64) {
        self.measurements.set(self.measurements.get() + 1);
        (self.width, self.height)
    }

    fn append(&mut self, element: TileElement) -> Result<()> {
        self.children.push(element);
        Ok(())
    }

    fn fill(&mut self, coord: TileCoord, data: Vec<u8>) -> Result<()> {
        if let Some(child) = self.children.iter_mut().find(|child| child.coord == coord) {
            child.data = Some(data);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.children.clear();
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_surface_lifecycle() {
        let mut surface = MemorySurface::new(300.0, 200.0);
        assert!(!surface.is_prepared());
        surface.prepare();
        assert!(surface.is_prepared());

        assert_eq!(surface.measure(), (300.0, 200.0));
        assert_eq!(surface.measurements(), 1);

        let coord = TileCoord::new(1, 2);
        surface.append(TileElement::new(coord, -10, 5, "u")).unwrap();
        assert_eq!(surface.child_count(), 1);
        assert!(!surface.child(coord).unwrap().is_loaded());

        surface.fill(coord, vec![1, 2, 3]).unwrap();
        assert_eq!(surface.child(coord).unwrap().data, Some(vec![1, 2, 3]));

        surface.clear();
        assert_eq!(surface.child_count(), 0);
    }

    #[test]
    fn test_element_intersection() {
        let inside = TileElement::new(TileCoord::new(0, 0), -100, -100, "u");
        assert!(inside.intersects(300.0, 200.0));

        let left_of = TileElement::new(TileCoord::new(0, 0), -256, 0, "u");
        assert!(!left_of.intersects(300.0, 200.0));

        let below = TileElement::new(TileCoord::new(0, 0), 0, 200, "u");
        assert!(!below.intersects(300.0, 200.0));
    }
}
