//! Completion service implementations.
//!
//! Use `create_client()` to instantiate the configured client.

pub mod gemini;

use crate::client::CompletionClient;
use crate::config::LlmConfig;
use crate::error::CompletionError;
use std::sync::Arc;

pub use gemini::GeminiClient;

/// Create the completion client described by `config`.
///
/// A missing API key is not an error here; it is reported by the client on
/// the first request, before any network call.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    if config.provider != "gemini" {
        tracing::warn!(
            provider = config.provider.as_str(),
            "Unsupported provider configured; using Gemini"
        );
    }
    Ok(Arc::new(GeminiClient::new(config)?))
}
