use std::fmt;

use thiserror::Error;

use crate::shared::encoded_image::{EncodedImage, ImagePayloadError};

#[derive(Error, Debug)]
pub enum EditError {
    #[error("edit instruction is empty")]
    EmptyInstruction,
    #[error("edit request failed: {0}")]
    Request(String),
    #[error("edit service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("no edited image returned")]
    NoImage,
    #[error("edited image payload is invalid: {0}")]
    InvalidPayload(#[from] ImagePayloadError),
    #[error("an edit is already in progress")]
    EditInFlight,
    #[error("there is no generated portrait to edit")]
    NothingToEdit,
}

/// Free-text edit request, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditInstruction(String);

impl EditInstruction {
    pub fn parse(text: &str) -> Result<Self, EditError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(EditError::EmptyInstruction);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EditInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Applies an instruction to the current generated portrait, keeping
/// identity and pose.
pub trait ImageEditor: Send + Sync {
    fn edit(
        &self,
        current: &EncodedImage,
        instruction: &EditInstruction,
    ) -> Result<EncodedImage, EditError>;
}
