use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ImagePayloadError {
    #[error("image payload is empty")]
    Empty,
    #[error("invalid base64 image payload: {0}")]
    Base64(String),
}

/// Encoded still image bytes (JPEG or PNG) with their MIME type.
///
/// Captured and generated portraits are both carried in this form. Bytes are
/// always stored without any data-URI prefix; the prefix exists only at the
/// edges where a data URI is consumed or produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    mime_type: String,
}

pub const JPEG_MIME: &str = "image/jpeg";
pub const PNG_MIME: &str = "image/png";

const DATA_URI_PREFIXES: &[(&str, &str)] = &[
    ("data:image/png;base64,", PNG_MIME),
    ("data:image/jpeg;base64,", JPEG_MIME),
    ("data:image/jpg;base64,", JPEG_MIME),
];

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, JPEG_MIME)
    }

    /// Decodes a base64 payload, accepting either a bare payload or one
    /// carrying a `data:image/(png|jpeg|jpg);base64,` prefix.
    ///
    /// Bare payloads take `default_mime`.
    pub fn from_base64(payload: &str, default_mime: &str) -> Result<Self, ImagePayloadError> {
        let (body, mime) = strip_data_uri(payload);
        let body = body.trim();
        if body.is_empty() {
            return Err(ImagePayloadError::Empty);
        }
        let bytes = STANDARD
            .decode(body)
            .map_err(|e| ImagePayloadError::Base64(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ImagePayloadError::Empty);
        }
        Ok(Self::new(bytes, mime.unwrap_or(default_mime)))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 of the raw bytes, no prefix.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        if self.mime_type == PNG_MIME {
            "png"
        } else {
            "jpg"
        }
    }
}

/// Splits a known data-URI prefix off `payload`, returning the remaining
/// body and the MIME type the prefix named.
pub fn strip_data_uri(payload: &str) -> (&str, Option<&'static str>) {
    DATA_URI_PREFIXES
        .iter()
        .find_map(|(prefix, mime)| payload.strip_prefix(prefix).map(|rest| (rest, Some(*mime))))
        .unwrap_or((payload, None))
}
