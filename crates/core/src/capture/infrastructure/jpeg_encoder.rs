use crate::capture::domain::frame_source::CaptureError;
use crate::capture::domain::image_encoder::ImageEncoder;
use crate::shared::constants::CAPTURE_JPEG_QUALITY;
use crate::shared::encoded_image::EncodedImage;
use crate::shared::frame::Frame;

/// Encodes frames as baseline JPEG using the `image` crate.
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    pub fn new() -> Self {
        Self::with_quality(CAPTURE_JPEG_QUALITY)
    }

    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEncoder for JpegEncoder {
    fn encode(&self, frame: &Frame) -> Result<EncodedImage, CaptureError> {
        let mut bytes = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, self.quality);
        image::ImageEncoder::write_image(
            encoder,
            frame.data(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
        Ok(EncodedImage::jpeg(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::encoded_image::JPEG_MIME;

    fn gradient(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 4) as u8, (y * 4) as u8, 128]);
            }
        }
        Frame::new(data, width, height)
    }

    #[test]
    fn test_output_is_jpeg_at_native_size() {
        let encoded = JpegEncoder::new().encode(&gradient(40, 60)).unwrap();
        assert_eq!(encoded.mime_type(), JPEG_MIME);
        assert_eq!(&encoded.bytes()[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(encoded.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 60));
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let frame = gradient(64, 64);
        let high = JpegEncoder::with_quality(95).encode(&frame).unwrap();
        let low = JpegEncoder::with_quality(10).encode(&frame).unwrap();
        assert!(low.len() < high.len());
    }
}
