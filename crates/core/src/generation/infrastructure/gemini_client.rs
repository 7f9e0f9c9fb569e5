use std::time::Duration;

use crate::detection::domain::detection_result::DetectionResult;
use crate::era::domain::era::Era;
use crate::generation::domain::image_editor::{EditError, EditInstruction, ImageEditor};
use crate::generation::domain::image_generator::{GenerationError, ImageGenerator};
use crate::generation::domain::prompt_builder::{edit_prompt, generation_prompt};
use crate::shared::constants::{
    DEFAULT_GENERATION_ENDPOINT, DEFAULT_GENERATION_MODEL, GENERATION_TIMEOUT_SECS,
    OUTPUT_ASPECT_RATIO,
};
use crate::shared::encoded_image::{EncodedImage, ImagePayloadError};

use super::gemini_wire::{GenerateContentRequest, GenerateContentResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for the Generative Language REST API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_GENERATION_ENDPOINT.to_string(),
            model: DEFAULT_GENERATION_MODEL.to_string(),
            timeout: Duration::from_secs(GENERATION_TIMEOUT_SECS),
        }
    }
}

/// Image generation and editing through Gemini `generateContent`.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    config: GeminiConfig,
}

/// Failure of one round trip, before it is attributed to generation or edit.
#[derive(Debug)]
enum CallError {
    MissingApiKey,
    Request(String),
    Status { status: u16, body: String },
    NoImage,
    Payload(ImagePayloadError),
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn call(&self, image: &EncodedImage, prompt: String) -> Result<EncodedImage, CallError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CallError::MissingApiKey)?;

        let request = GenerateContentRequest::image_and_text(image, prompt, OUTPUT_ASPECT_RATIO);
        let response = self
            .http
            .post(self.url())
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .map_err(|e| CallError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CallError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| CallError::Request(e.to_string()))?;
        match parsed.first_image().map_err(CallError::Payload)? {
            Some(image) => Ok(image),
            None => {
                if let Some(text) = parsed.text() {
                    log::warn!("Model answered without an image: {text}");
                }
                Err(CallError::NoImage)
            }
        }
    }
}

impl ImageGenerator for GeminiClient {
    fn generate(
        &self,
        source: &EncodedImage,
        era: &Era,
        detection: &DetectionResult,
    ) -> Result<EncodedImage, GenerationError> {
        let prompt = generation_prompt(era, detection);
        log::debug!("Generation prompt:\n{prompt}");
        log::info!(
            "Requesting {} portrait from {} ({} bytes in)",
            era.name,
            self.config.model,
            source.len()
        );
        self.call(source, prompt).map_err(GenerationError::from)
    }
}

impl ImageEditor for GeminiClient {
    fn edit(
        &self,
        current: &EncodedImage,
        instruction: &EditInstruction,
    ) -> Result<EncodedImage, EditError> {
        let prompt = edit_prompt(instruction);
        log::debug!("Edit prompt:\n{prompt}");
        self.call(current, prompt).map_err(EditError::from)
    }
}

impl From<CallError> for GenerationError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::MissingApiKey => GenerationError::MissingApiKey,
            CallError::Request(msg) => GenerationError::Request(msg),
            CallError::Status { status, body } => GenerationError::Status { status, body },
            CallError::NoImage => GenerationError::NoImage,
            CallError::Payload(e) => GenerationError::InvalidPayload(e),
        }
    }
}

impl From<CallError> for EditError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::MissingApiKey => {
                EditError::Request("no API key configured (set GEMINI_API_KEY)".into())
            }
            CallError::Request(msg) => EditError::Request(msg),
            CallError::Status { status, body } => EditError::Status { status, body },
            CallError::NoImage => EditError::NoImage,
            CallError::Payload(e) => EditError::InvalidPayload(e),
        }
    }
}
