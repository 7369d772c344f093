/// Output dimensions for a live stream, fixed on its first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamGeometry {
    pub source_width: u32,
    pub source_height: u32,
    pub output_width: u32,
    pub output_height: u32,
}

impl StreamGeometry {
    /// Scales the source to `target_width`, preserving aspect ratio.
    ///
    /// A zero target width scales to `target_height` instead; both zero keeps
    /// the native size.
    pub fn fit(source_width: u32, source_height: u32, target_width: u32, target_height: u32) -> Self {
        let (output_width, output_height) = if source_width == 0 || source_height == 0 {
            (source_width, source_height)
        } else if target_width > 0 {
            let h = (target_width as f64 * source_height as f64 / source_width as f64).round();
            (target_width, h as u32)
        } else if target_height > 0 {
            let w = (target_height as f64 * source_width as f64 / source_height as f64).round();
            (w as u32, target_height)
        } else {
            (source_width, source_height)
        };
        Self {
            source_width,
            source_height,
            output_width,
            output_height,
        }
    }

    pub fn is_native(&self) -> bool {
        self.source_width == self.output_width && self.source_height == self.output_height
    }
}
