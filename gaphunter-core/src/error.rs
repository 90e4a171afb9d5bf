//! Error types for the GapHunter core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering configuration, the completion service, response parsing, file
//! loading and diagram rendering.

use std::path::PathBuf;

/// Generic message shown when a model response cannot be turned into a result.
pub const SYNTHESIS_FAILED_MESSAGE: &str = "Failed to synthesize research.";

/// Failure of one synthesis request, as stored in the error banner.
#[derive(Debug, thiserror::Error)]
pub enum GapHunterError {
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl GapHunterError {
    /// The message placed in the error banner for this failure.
    ///
    /// Service errors, including a missing API key, are surfaced verbatim.
    /// Parse errors collapse into a generic synthesis failure; the raw
    /// response is logged, not shown.
    pub fn user_message(&self) -> String {
        match self {
            GapHunterError::Completion(e) => e.service_message(),
            GapHunterError::Parse(_) => SYNTHESIS_FAILED_MESSAGE.to_string(),
        }
    }
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API key is missing. Please add {var} to your environment or .env file.")]
    MissingApiKey { var: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the completion service boundary.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("The model returned no content{}", .reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    EmptyResponse { reason: Option<String> },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CompletionError {
    /// The service-provided message, without the variant prefix.
    pub fn service_message(&self) -> String {
        match self {
            CompletionError::ApiRequest { message }
            | CompletionError::AuthFailed { message }
            | CompletionError::QuotaExceeded { message }
            | CompletionError::Connection { message }
            | CompletionError::ResponseParse { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors from decoding the model's free-text response.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("No JSON object found in response: {message}")]
    NoJsonObject { message: String },

    #[error("Response JSON is malformed: {message}")]
    Malformed { message: String },

    #[error("Response JSON does not match the analysis schema: {message}")]
    Schema { message: String },
}

/// Errors from loading user-selected files.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No file at index {index} (list has {len} file(s))")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors from the diagram renderer boundary.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("Diagram syntax error: {message}")]
    Syntax { message: String },

    #[error("Diagram renderer unavailable: {message}")]
    Unavailable { message: String },

    #[error("Diagram render IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A type alias for results using the top-level `GapHunterError`.
pub type Result<T> = std::result::Result<T, GapHunterError>;
