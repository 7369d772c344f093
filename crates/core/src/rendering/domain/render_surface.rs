use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};
use thiserror::Error;

use crate::rendering::domain::color::Color;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("unsupported channel count {0} (expected 3 or 4)")]
    UnsupportedChannels(u8),
    #[error("surface is empty")]
    Empty,
}

/// RGBA drawing surface issued by the frame stager.
///
/// Inference reads it through [`RenderSurface::frame`]; annotation draws
/// through [`RenderSurface::canvas`]. Only the stager replaces its contents.
#[derive(Debug, Clone, Default)]
pub struct RenderSurface {
    frame: Frame,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Resizes to `width x height`, discarding all content.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.frame = Frame::blank(width, height);
    }

    /// Replaces the whole surface with `asset`, matching its native size.
    pub(crate) fn copy_from(&mut self, asset: &Frame) -> Result<(), SurfaceError> {
        let data = match asset.channels() {
            4 => asset.data().to_vec(),
            3 => {
                let mut rgba = Vec::with_capacity(asset.data().len() / 3 * 4);
                for px in asset.data().chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                rgba
            }
            other => return Err(SurfaceError::UnsupportedChannels(other)),
        };
        self.frame = Frame::new(data, asset.width(), asset.height(), 4, asset.index());
        Ok(())
    }

    /// Sets every pixel to transparent black.
    pub fn clear(&mut self) {
        self.fill(Color::TRANSPARENT);
    }

    pub fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba().0;
        for px in self.frame.data_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Mutable image view over the surface pixels, `None` while empty.
    pub fn canvas(&mut self) -> Option<ImageBuffer<Rgba<u8>, &mut [u8]>> {
        let (w, h) = (self.frame.width(), self.frame.height());
        if w == 0 || h == 0 {
            return None;
        }
        ImageBuffer::from_raw(w, h, self.frame.data_mut())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let offset = ((y * self.width() + x) * 4) as usize;
        let data = self.frame.data();
        Some([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        self.frame.to_rgba_image()
    }

    /// Writes the surface to disk; the format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let image = self.to_image().ok_or(SurfaceError::Empty)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(SurfaceError::Empty.into());
        }
        image.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_empty() {
        let mut surface = RenderSurface::new();
        assert_eq!((surface.width(), surface.height()), (0, 0));
        assert!(surface.canvas().is_none());
    }

    #[test]
    fn test_copy_from_rgb_expands_alpha() {
        let mut surface = RenderSurface::new();
        let asset = Frame::new(vec![9, 8, 7, 6, 5, 4], 2, 1, 3, 3);
        surface.copy_from(&asset).unwrap();
        assert_eq!(surface.pixel(0, 0), Some([9, 8, 7, 255]));
        assert_eq!(surface.pixel(1, 0), Some([6, 5, 4, 255]));
        assert_eq!(surface.frame().index(), 3);
    }

    #[test]
    fn test_copy_from_rejects_grayscale() {
        let mut surface = RenderSurface::new();
        let asset = Frame::new(vec![0; 4], 2, 2, 1, 0);
        assert_eq!(
            surface.copy_from(&asset),
            Err(SurfaceError::UnsupportedChannels(1))
        );
    }

    #[test]
    fn test_fill_then_clear() {
        let mut surface = RenderSurface::new();
        surface.resize(3, 3);
        surface.fill(Color::rgb(1, 2, 3));
        assert_eq!(surface.pixel(2, 2), Some([1, 2, 3, 255]));
        surface.clear();
        surface.clear();
        assert_eq!(surface.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let mut surface = RenderSurface::new();
        surface.resize(2, 2);
        assert_eq!(surface.pixel(2, 0), None);
    }

    #[test]
    fn test_save_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let mut surface = RenderSurface::new();
        surface.resize(4, 3);
        surface.fill(Color::rgb(255, 0, 0));
        surface.save(&path).unwrap();

        let written = image::open(&path).unwrap().into_rgba8();
        assert_eq!(written.dimensions(), (4, 3));
        assert_eq!(written.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_save_empty_surface_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RenderSurface::new().save(&dir.path().join("x.png")).is_err());
    }
}
