//! JSON bodies of the Generative Language `generateContent` call.

use serde::{Deserialize, Serialize};

use crate::shared::encoded_image::{EncodedImage, ImagePayloadError, JPEG_MIME};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<&'static str>,
    pub image_config: ImageConfig,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: &'static str,
}

#[derive(Deserialize, Debug, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentRequest {
    /// One user turn: the image first, then the instruction text.
    pub fn image_and_text(image: &EncodedImage, text: String, aspect_ratio: &'static str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: Some(image.mime_type().to_string()),
                            data: image.to_base64(),
                        }),
                        text: None,
                    },
                    Part {
                        inline_data: None,
                        text: Some(text),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE"],
                image_config: ImageConfig { aspect_ratio },
            },
        }
    }
}

impl GenerateContentResponse {
    /// First inline image of the first candidate.
    ///
    /// `Ok(None)` when the candidate carries no image part (text-only refusals
    /// land here).
    pub fn first_image(&self) -> Result<Option<EncodedImage>, ImagePayloadError> {
        let Some(content) = self.candidates.first().and_then(|c| c.content.as_ref()) else {
            return Ok(None);
        };
        let Some(inline) = content.parts.iter().find_map(|p| p.inline_data.as_ref()) else {
            return Ok(None);
        };
        let mime = inline.mime_type.as_deref().unwrap_or(JPEG_MIME);
        EncodedImage::from_base64(&inline.data, mime).map(Some)
    }

    /// Any text the model returned instead of (or alongside) an image.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: Vec<&str> = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then(|| text.join(" "))
    }
}
