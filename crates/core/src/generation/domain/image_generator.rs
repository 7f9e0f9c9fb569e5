use thiserror::Error;

use crate::detection::domain::detection_result::DetectionResult;
use crate::era::domain::era::Era;
use crate::shared::encoded_image::{EncodedImage, ImagePayloadError};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("no image generated")]
    NoImage,
    #[error("generated image payload is invalid: {0}")]
    InvalidPayload(#[from] ImagePayloadError),
    #[error("no API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
}

/// Reimagines a captured portrait in the style of an era.
///
/// The output keeps the subjects' faces and head pose; only clothing,
/// accessories, hairstyle and background change. Implementations must fail
/// rather than return any image other than the one the service produced.
pub trait ImageGenerator: Send + Sync {
    fn generate(
        &self,
        source: &EncodedImage,
        era: &Era,
        detection: &DetectionResult,
    ) -> Result<EncodedImage, GenerationError>;
}
