use image::{DynamicImage, RgbaImage};
use ndarray::ArrayView3;

/// A decoded visual asset: contiguous pixel bytes in row-major order.
///
/// Sources decode into RGBA; camera frames may arrive as RGB. Consumers that
/// only need color read the first three channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Converts any decoded image into a 4-channel frame.
    pub fn from_image(image: DynamicImage, index: usize) -> Self {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(rgba.into_raw(), width, height, 4, index)
    }

    /// A fully transparent RGBA frame.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(vec![0; (width as usize) * (height as usize) * 4], width, height, 4, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels into an owned RGBA image, expanding RGB if needed.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        match self.channels {
            4 => RgbaImage::from_raw(self.width, self.height, self.data.clone()),
            3 => {
                let mut rgba = Vec::with_capacity(self.data.len() / 3 * 4);
                for px in self.data.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                RgbaImage::from_raw(self.width, self.height, rgba)
            }
            _ => None,
        }
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame::blank(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 16]; // 2x2x4
        let frame = Frame::new(data.clone(), 2, 2, 4, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 4);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_from_image_produces_rgba() {
        let img = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let frame = Frame::from_image(DynamicImage::ImageRgb8(img), 7);
        assert_eq!(frame.channels(), 4);
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(&frame.data()[..4], &[10, 20, 30, 255]);
        assert_eq!(frame.index(), 7);
    }

    #[test]
    fn test_rgb_frame_expands_to_rgba_image() {
        let frame = Frame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, 3, 0);
        let img = frame.to_rgba_image().unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [4, 5, 6, 255]);
    }

    #[test]
    fn test_blank_is_transparent() {
        let frame = Frame::blank(4, 4);
        assert!(frame.data().iter().all(|&b| b == 0));
        assert!(!frame.is_empty());
        assert!(Frame::blank(0, 4).is_empty());
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::blank(4, 2);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 4]);
    }
}
