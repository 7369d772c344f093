use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::shared::frame::Frame;
use crate::source::domain::source_error::SourceError;

/// Decodes in-memory image bytes into an RGBA frame.
///
/// A known `image/*` MIME type selects the decoder; a missing or unknown
/// one falls back to sniffing the content. Non-image MIME types are rejected.
pub fn decode_image(bytes: &[u8], mime_type: Option<&str>) -> Result<Frame, SourceError> {
    let format = match mime_type.map(str::trim).filter(|m| !m.is_empty()) {
        None => None,
        Some(mime) => {
            let essence = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
            if !essence.starts_with("image/") {
                return Err(SourceError::UnsupportedMime(mime.to_string()));
            }
            ImageFormat::from_mime_type(&essence)
        }
    };

    let image = match format {
        Some(format) => image::load_from_memory_with_format(bytes, format),
        None => ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| SourceError::Decode(e.to_string()))?
            .decode(),
    }
    .map_err(|e| SourceError::Decode(e.to_string()))?;

    Ok(Frame::from_image(image, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn encode(format: ImageFormat) -> Vec<u8> {
        let mut img = RgbImage::new(4, 3);
        img.put_pixel(1, 2, Rgb([200, 10, 20]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decodes_png_by_mime() {
        let frame = decode_image(&encode(ImageFormat::Png), Some("image/png")).unwrap();
        assert_eq!((frame.width(), frame.height(), frame.channels()), (4, 3, 4));
        let offset = (2 * 4 + 1) * 4;
        assert_eq!(&frame.data()[offset..offset + 4], &[200, 10, 20, 255]);
    }

    #[test]
    fn test_sniffs_without_mime() {
        let frame = decode_image(&encode(ImageFormat::Bmp), None).unwrap();
        assert_eq!((frame.width(), frame.height()), (4, 3));
    }

    #[test]
    fn test_unknown_image_subtype_sniffs() {
        let frame = decode_image(&encode(ImageFormat::Png), Some("image/x-unknown")).unwrap();
        assert_eq!(frame.width(), 4);
    }

    #[test]
    fn test_mime_parameters_ignored() {
        let frame = decode_image(&encode(ImageFormat::Png), Some("Image/PNG; charset=binary"))
            .unwrap();
        assert_eq!(frame.height(), 3);
    }

    #[test]
    fn test_rejects_non_image_mime() {
        let err = decode_image(&encode(ImageFormat::Png), Some("text/plain")).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedMime(m) if m == "text/plain"));
    }

    #[test]
    fn test_corrupt_bytes_fail_to_decode() {
        let err = decode_image(b"definitely not an image", Some("image/png")).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[test]
    fn test_unrecognised_content_fails() {
        let err = decode_image(b"????", None).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
