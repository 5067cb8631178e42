//! Raster surface backed by an RGBA image
//!
//! Decodes tile bytes (PNG, JPEG, ... whatever `image` understands) and
//! composites them onto a fixed-size canvas. The canvas clips for free:
//! pixels falling outside it are simply not drawn.

use image::{imageops, Rgba, RgbaImage};
use std::path::Path;

use super::surface::{Surface, TileElement};
use crate::core::geo::TileCoord;
use crate::Result;

/// Light grey, the usual empty-map backdrop
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([230, 230, 230, 255]);

#[derive(Debug, Clone)]
pub struct RasterSurface {
    canvas: RgbaImage,
    background: Rgba<u8>,
    children: Vec<TileElement>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, DEFAULT_BACKGROUND)
    }

    pub fn with_background(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, background),
            background,
            children: Vec::new(),
        }
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn children(&self) -> &[TileElement] {
        &self.children
    }

    /// Write the canvas to disk; the format follows the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.canvas.save(path)?;
        Ok(())
    }

    fn draw(&mut self, element: &TileElement, data: &[u8]) -> Result<()> {
        let mut tile = image::load_from_memory(data)?.to_rgba8();
        if tile.dimensions() != (element.width, element.height) {
            tile = imageops::resize(
                &tile,
                element.width,
                element.height,
                imageops::FilterType::Triangle,
            );
        }

        imageops::overlay(&mut self.canvas, &tile, element.left, element.top);
        Ok(())
    }

    fn repaint(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = self.background;
        }
    }
}

impl Surface for RasterSurface {
    fn prepare(&mut self) {
        self.repaint();
    }

    fn measure(&self) -> (f64, f64) {
        let (width, height) = self.canvas.dimensions();
        (width as f64, height as f64)
    }

    fn append(&mut self, element: TileElement) -> Result<()> {
        if let Some(data) = &element.data {
            self.draw(&element, data)?;
        }
        self.children.push(element);
        Ok(())
    }

    fn fill(&mut self, coord: TileCoord, data: Vec<u8>) -> Result<()> {
        let Some(idx) = self.children.iter().position(|child| child.coord == coord) else {
            return Ok(());
        };

        let element = self.children[idx].clone();
        self.draw(&element, &data)?;
        self.children[idx].data = Some(data);
        Ok(())
    }

    fn clear(&mut self) {
        self.children.clear();
        self.repaint();
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }
}
