use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detection::domain::detection::Detection;
use crate::rendering::domain::color::{Color, ColorParseError};
use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::configuration::Configuration;
use crate::shared::rectangle::Rectangle;

/// Strokes detection boxes onto a staged surface.
///
/// A stroke of width `n` straddles the box edge, `n / 2` pixels outside
/// and the rest inside, the way a 2D canvas strokes a path.
#[derive(Clone, Debug)]
pub struct AnnotationRenderer {
    stroke: Color,
    line_width: u32,
}

impl AnnotationRenderer {
    pub fn new(stroke: Color, line_width: u32) -> Self {
        Self {
            stroke,
            line_width: line_width.max(1),
        }
    }

    pub fn from_config(config: &Configuration) -> Result<Self, ColorParseError> {
        Ok(Self::new(config.stroke_color()?, config.line_width))
    }

    pub fn stroke(&self) -> Color {
        self.stroke
    }

    pub fn line_width(&self) -> u32 {
        self.line_width
    }

    /// Draws one rectangle per detection, in the order given.
    ///
    /// Returns the unclipped rectangles drawn, one per detection.
    pub fn render(&self, surface: &mut RenderSurface, detections: &[Detection]) -> Vec<Rectangle> {
        let rects: Vec<Rectangle> = detections.iter().map(Detection::rectangle).collect();
        if let Some(mut canvas) = surface.canvas() {
            let color = self.stroke.to_rgba();
            let half = (self.line_width / 2) as i32;
            for rect in &rects {
                for ring in 0..self.line_width as i32 {
                    let r = rect.inflate(half - ring);
                    if r.width < 0 || r.height < 0 {
                        break;
                    }
                    // A zero-width or zero-height ring still strokes a line.
                    let (w, h) = (r.width.max(1) as u32, r.height.max(1) as u32);
                    draw_hollow_rect_mut(&mut canvas, Rect::at(r.x, r.y).of_size(w, h), color);
                }
            }
        }
        rects
    }

    pub fn clear(&self, surface: &mut RenderSurface) {
        surface.clear();
    }

    pub fn fill(&self, surface: &mut RenderSurface, color: Color) {
        surface.fill(color);
    }
}
