//! Core types for GapHunter.
//!
//! Defines the uploaded/encoded file representations, the structured analysis
//! result decoded from the model, and the completion request/response pair
//! exchanged with the completion service.

use serde::{Deserialize, Serialize};

/// A user-selected file held in memory until removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original file name (no directory component).
    pub name: String,
    /// Declared media type, e.g. `application/pdf`.
    pub media_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Transmittable projection of an [`UploadedFile`]: base64 payload plus media type.
///
/// Lives only for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedFilePart {
    pub data: String,
    pub media_type: String,
}

/// The research proposal section of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub methodology: String,
}

/// Structured result decoded from the model response.
///
/// Every field is required; a response missing any of them fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub gap_analysis: String,
    pub proposal: Proposal,
    pub mermaid_code: String,
}

impl AnalysisResult {
    /// Whether the model produced any flowchart source at all.
    pub fn has_diagram(&self) -> bool {
        !self.mermaid_code.is_empty()
    }
}

/// A single request to the completion service.
///
/// Parts are transmitted in order: system text, file parts, user text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub files: Vec<EncodedFilePart>,
    pub user: String,
}

/// Token usage reported by the completion service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// The raw reply from the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Concatenated text of the reply; expected, not guaranteed, to hold one JSON object.
    pub text: String,
    pub model: String,
    pub finish_reason: Option<String>,
    pub usage: TokenUsage,
}
