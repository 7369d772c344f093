use image::imageops::{self, FilterType};

use crate::rendering::domain::render_surface::{RenderSurface, SurfaceError};
use crate::shared::frame::Frame;

/// Dimensions and index of the most recently staged asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedFrame {
    pub width: u32,
    pub height: u32,
    pub index: usize,
}

/// Owns the render surface and copies each asset onto it.
///
/// Single slot: staging always overwrites the previous contents.
#[derive(Debug, Default)]
pub struct FrameStager {
    surface: RenderSurface,
    last: Option<StagedFrame>,
}

impl FrameStager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resizes the surface to the asset's native size and copies it in.
    pub fn stage(&mut self, asset: &Frame) -> Result<&mut RenderSurface, SurfaceError> {
        if asset.is_empty() {
            return Err(SurfaceError::Empty);
        }
        self.surface.copy_from(asset)?;
        self.last = Some(StagedFrame {
            width: asset.width(),
            height: asset.height(),
            index: asset.index(),
        });
        log::debug!(
            "Staged frame {} ({}x{})",
            asset.index(),
            asset.width(),
            asset.height()
        );
        Ok(&mut self.surface)
    }

    /// Stages `asset` scaled to `width x height`.
    pub fn stage_scaled(
        &mut self,
        asset: &Frame,
        width: u32,
        height: u32,
    ) -> Result<&mut RenderSurface, SurfaceError> {
        if asset.width() == width && asset.height() == height {
            return self.stage(asset);
        }
        if width == 0 || height == 0 {
            return Err(SurfaceError::Empty);
        }
        let image = asset
            .to_rgba_image()
            .ok_or(SurfaceError::UnsupportedChannels(asset.channels()))?;
        let scaled = imageops::resize(&image, width, height, FilterType::Triangle);
        let frame = Frame::new(scaled.into_raw(), width, height, 4, asset.index());
        self.stage(&frame)
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut RenderSurface {
        &mut self.surface
    }

    pub fn last_staged(&self) -> Option<StagedFrame> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8, index: usize) -> Frame {
        Frame::new(
            vec![value; (width * height * 3) as usize],
            width,
            height,
            3,
            index,
        )
    }

    #[test]
    fn test_stage_matches_native_size() {
        let mut stager = FrameStager::new();
        let surface = stager.stage(&solid(8, 6, 40, 3)).unwrap();
        assert_eq!((surface.width(), surface.height()), (8, 6));
        assert_eq!(surface.pixel(7, 5), Some([40, 40, 40, 255]));
        assert_eq!(
            stager.last_staged(),
            Some(StagedFrame {
                width: 8,
                height: 6,
                index: 3
            })
        );
    }

    #[test]
    fn test_restage_fully_overwrites() {
        let mut stager = FrameStager::new();
        stager.stage(&solid(10, 10, 200, 0)).unwrap();
        let surface = stager.stage(&solid(4, 2, 7, 1)).unwrap();
        assert_eq!((surface.width(), surface.height()), (4, 2));
        assert_eq!(surface.pixel(0, 0), Some([7, 7, 7, 255]));
        assert_eq!(surface.pixel(5, 5), None);
    }

    #[test]
    fn test_stage_rejects_empty_asset() {
        let mut stager = FrameStager::new();
        stager.stage(&solid(2, 2, 1, 0)).unwrap();
        assert_eq!(
            stager.stage(&Frame::blank(0, 0)).unwrap_err(),
            SurfaceError::Empty
        );
        assert_eq!(stager.last_staged().map(|s| s.width), Some(2));
    }

    #[test]
    fn test_stage_rejects_grayscale() {
        let mut stager = FrameStager::new();
        let gray = Frame::new(vec![0; 4], 2, 2, 1, 0);
        assert_eq!(
            stager.stage(&gray).unwrap_err(),
            SurfaceError::UnsupportedChannels(1)
        );
        assert!(stager.last_staged().is_none());
    }

    #[test]
    fn test_stage_scaled_resizes() {
        let mut stager = FrameStager::new();
        let surface = stager.stage_scaled(&solid(16, 9, 90, 5), 8, 5).unwrap();
        assert_eq!((surface.width(), surface.height()), (8, 5));
        assert_eq!(surface.pixel(4, 2), Some([90, 90, 90, 255]));
        assert_eq!(stager.last_staged().map(|s| s.index), Some(5));
    }
}
