use crate::capture::domain::frame_source::CaptureError;
use crate::shared::encoded_image::EncodedImage;
use crate::shared::frame::Frame;

/// Turns a rasterized frame into the encoded still sent to generation.
pub trait ImageEncoder: Send {
    fn encode(&self, frame: &Frame) -> Result<EncodedImage, CaptureError>;
}
