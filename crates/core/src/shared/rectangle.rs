use serde::{Serialize, Serializer};

/// Axis-aligned box in integer pixels, reported to hosts as `[x, y, w, h]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from two corners, rounding each to the nearest pixel.
    ///
    /// Corners given in the wrong order are normalized so width and
    /// height are never negative.
    pub fn from_corners(top_left: (f64, f64), bottom_right: (f64, f64)) -> Self {
        let x1 = top_left.0.min(bottom_right.0).round() as i32;
        let y1 = top_left.1.min(bottom_right.1).round() as i32;
        let x2 = top_left.0.max(bottom_right.0).round() as i32;
        let y2 = top_left.1.max(bottom_right.1).round() as i32;
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn as_array(&self) -> [i32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Grows (positive) or shrinks (negative) the box by `amount` on every side.
    pub fn inflate(&self, amount: i32) -> Rectangle {
        Rectangle::new(
            self.x - amount,
            self.y - amount,
            self.width + 2 * amount,
            self.height + 2 * amount,
        )
    }
}

impl Serialize for Rectangle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_array().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_from_corners_computes_width_and_height() {
        let r = Rectangle::from_corners((10.0, 10.0), (50.0, 60.0));
        assert_eq!(r.as_array(), [10, 10, 40, 50]);
    }

    #[test]
    fn test_from_corners_rounds_to_nearest_pixel() {
        let r = Rectangle::from_corners((10.4, 9.6), (49.5, 60.2));
        assert_eq!(r.as_array(), [10, 10, 40, 50]);
    }

    #[test]
    fn test_from_corners_normalizes_swapped_corners() {
        let r = Rectangle::from_corners((50.0, 60.0), (10.0, 10.0));
        assert_eq!(r.as_array(), [10, 10, 40, 50]);
    }

    #[test]
    fn test_serializes_as_xywh_array() {
        let json = serde_json::to_string(&Rectangle::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, "[1,2,3,4]");
    }

    #[rstest]
    #[case::grow(2, Rectangle::new(28, 8, 4, 54))]
    #[case::unchanged(0, Rectangle::new(30, 10, 0, 50))]
    #[case::collapse(-1, Rectangle::new(31, 11, -2, 48))]
    fn test_inflate_zero_width_box(#[case] amount: i32, #[case] expected: Rectangle) {
        assert_eq!(Rectangle::new(30, 10, 0, 50).inflate(amount), expected);
    }

    #[test]
    fn test_inflate_and_shrink() {
        let r = Rectangle::new(10, 10, 20, 20);
        assert_eq!(r.inflate(2), Rectangle::new(8, 8, 24, 24));
        assert_eq!(r.inflate(-2), Rectangle::new(12, 12, 16, 16));
    }
}
