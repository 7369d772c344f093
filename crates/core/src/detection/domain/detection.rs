use crate::shared::rectangle::Rectangle;

/// Number of landmark points produced per face.
pub const NUM_LANDMARKS: usize = 6;

/// One face found by the inference capability, in surface pixel coordinates.
///
/// Landmarks follow BlazeFace order: right eye, left eye, nose tip, mouth
/// center, right ear tragion, left ear tragion.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub top_left: (f64, f64),
    pub bottom_right: (f64, f64),
    pub probability: f64,
    pub landmarks: [(f64, f64); NUM_LANDMARKS],
}

impl Detection {
    pub fn new(top_left: (f64, f64), bottom_right: (f64, f64), probability: f64) -> Self {
        Self {
            top_left,
            bottom_right,
            probability,
            landmarks: [(0.0, 0.0); NUM_LANDMARKS],
        }
    }

    pub fn with_landmarks(mut self, landmarks: [(f64, f64); NUM_LANDMARKS]) -> Self {
        self.landmarks = landmarks;
        self
    }

    pub fn rectangle(&self) -> Rectangle {
        Rectangle::from_corners(self.top_left, self.bottom_right)
    }
}
