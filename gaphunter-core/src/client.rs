//! The completion service seam.
//!
//! `CompletionClient` is the boundary the orchestrator talks to. The Gemini
//! implementation lives in `providers`; `MockCompletionClient` is a scripted
//! double for tests.

use crate::error::CompletionError;
use crate::types::{CompletionRequest, CompletionResponse, TokenUsage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A generative-text service that answers one prompt with one free-text reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue exactly one request and await the full reply.
    async fn complete(&self, request: CompletionRequest)
    -> Result<CompletionResponse, CompletionError>;

    /// Return the model name.
    fn model_name(&self) -> &str;
}

/// A scripted completion client for tests.
///
/// Answers come from a queue; once it is empty the default reply is used.
/// Every call yields to the scheduler once before answering, so a caller
/// awaiting it is observably in flight.
pub struct MockCompletionClient {
    model: String,
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    default_reply: String,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            replies: Mutex::new(VecDeque::new()),
            default_reply: String::new(),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a client that always answers with `text`.
    pub fn with_response(text: &str) -> Self {
        Self {
            default_reply: text.to_string(),
            ..Self::new()
        }
    }

    /// Queue a reply for the next call.
    pub fn queue_response(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    /// Queue a failure for the next call.
    pub fn queue_error(&self, error: CompletionError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Number of `complete` calls issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// A well-formed reply for tests, wrapped in chatter the parser must ignore.
    pub fn analysis_reply(gap: &str, mermaid: &str) -> String {
        let body = serde_json::json!({
            "gapAnalysis": gap,
            "proposal": {
                "title": "Bridging the Gap",
                "abstract": "We propose a study.",
                "methodology": "Collect data\nTrain model\nEvaluate"
            },
            "mermaidCode": mermaid,
        });
        format!("Sure! Here is the JSON:\n{}\nLet me know if you need more.", body)
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        tokio::task::yield_now().await;

        let next = self.replies.lock().unwrap().pop_front();
        let text = match next {
            Some(reply) => reply?,
            None => self.default_reply.clone(),
        };
        Ok(CompletionResponse {
            text,
            model: self.model.clone(),
            finish_reason: Some("STOP".to_string()),
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "sys".into(),
            files: Vec::new(),
            user: "usr".into(),
        }
    }

    #[tokio::test]
    async fn test_mock_returns_queued_then_default() {
        let client = MockCompletionClient::with_response("default");
        client.queue_response("first");

        let first = client.complete(request()).await.unwrap();
        assert_eq!(first.text, "first");
        let second = client.complete(request()).await.unwrap();
        assert_eq!(second.text, "default");
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_returns_queued_error() {
        let client = MockCompletionClient::new();
        client.queue_error(CompletionError::QuotaExceeded {
            message: "quota".into(),
        });
        let err = client.complete(request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::QuotaExceeded { .. }));
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_analysis_reply_is_parseable() {
        let reply = MockCompletionClient::analysis_reply("gap", "graph TD\nA-->B");
        let result = crate::parser::parse_analysis(&reply).unwrap();
        assert_eq!(result.gap_analysis, "gap");
        assert_eq!(result.mermaid_code, "graph TD\nA-->B");
    }
}
