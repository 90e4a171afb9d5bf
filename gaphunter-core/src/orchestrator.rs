//! Application state and the submit state machine.
//!
//! One [`Orchestrator`] owns the [`UiState`]. Every mutation is a named
//! transition, and the loading flag set under the state lock is what keeps
//! a second submission from starting while one is in flight.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──ok──▶ Succeeded
//!                      │                  │
//!                      └──err──▶ Failed ◀─┘ (next submit re-enters Submitting)
//! ```

use crate::client::CompletionClient;
use crate::error::{FileError, GapHunterError, Result};
use crate::files::{self, FileList};
use crate::parser::parse_analysis;
use crate::prompt::build_prompt;
use crate::types::{AnalysisResult, CompletionRequest, UploadedFile};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Named phase of the submit state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Submitting => write!(f, "submitting"),
            Phase::Succeeded => write!(f, "succeeded"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}

/// Everything the front end displays.
///
/// `result` and `error` are never both set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub topic: String,
    pub abstracts: String,
    pub files: FileList,
    pub is_loading: bool,
    pub error: Option<String>,
    pub result: Option<AnalysisResult>,
}

impl UiState {
    /// Whether at least one input is non-empty. Whitespace counts as input.
    pub fn has_input(&self) -> bool {
        !self.topic.is_empty() || !self.abstracts.is_empty() || !self.files.is_empty()
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_loading && self.has_input()
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Submitting
        } else if self.result.is_some() {
            Phase::Succeeded
        } else if self.error.is_some() {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    fn begin_submission(&mut self) {
        self.is_loading = true;
        self.error = None;
        self.result = None;
    }

    fn succeed(&mut self, result: AnalysisResult) {
        self.is_loading = false;
        self.error = None;
        self.result = Some(result);
    }

    fn fail(&mut self, message: String) {
        self.is_loading = false;
        self.result = None;
        self.error = Some(message);
    }
}

/// The main pane: the empty state or a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Empty,
    Result(AnalysisResult),
}

/// A projection of the state for drawing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub view: View,
    pub error_banner: Option<String>,
    pub is_loading: bool,
    pub can_submit: bool,
}

/// Why a submit was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyInput,
    AlreadySubmitting,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::EmptyInput => {
                write!(f, "enter a topic, paste abstracts, or add a file first")
            }
            RejectReason::AlreadySubmitting => write!(f, "a synthesis is already in progress"),
        }
    }
}

/// How a call to [`Orchestrator::submit`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    /// The request failed; carries the banner message.
    Failed(String),
    /// The guard refused to start a request.
    Rejected(RejectReason),
}

/// Owns the UI state and runs submissions against a completion client.
pub struct Orchestrator {
    state: Mutex<UiState>,
    client: Arc<dyn CompletionClient>,
    accepted_extensions: Vec<String>,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            state: Mutex::new(UiState::default()),
            client,
            accepted_extensions: Vec::new(),
        }
    }

    /// Set the advisory extension list used when adding files.
    pub fn with_accepted_extensions(mut self, accepted: Vec<String>) -> Self {
        self.accepted_extensions = accepted;
        self
    }

    fn lock(&self) -> MutexGuard<'_, UiState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    pub fn set_topic(&self, topic: impl Into<String>) {
        self.lock().topic = topic.into();
    }

    pub fn set_abstracts(&self, abstracts: impl Into<String>) {
        self.lock().abstracts = abstracts.into();
    }

    /// Load and append one selection of files.
    ///
    /// All-or-nothing: on any read failure nothing is appended.
    pub async fn add_files(&self, paths: &[PathBuf]) -> std::result::Result<usize, FileError> {
        let loaded = files::load_files(paths, &self.accepted_extensions).await?;
        let count = loaded.len();
        self.append_files(loaded);
        Ok(count)
    }

    /// Append already-loaded files in order.
    pub fn append_files(&self, files: Vec<UploadedFile>) {
        self.lock().files.extend(files);
    }

    pub fn remove_file(&self, index: usize) -> std::result::Result<UploadedFile, FileError> {
        self.lock().files.remove(index)
    }

    /// Clear the error banner. Inputs are left untouched.
    pub fn dismiss_error(&self) {
        self.lock().error = None;
    }

    pub fn can_submit(&self) -> bool {
        self.lock().can_submit()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase()
    }

    pub fn snapshot(&self) -> UiState {
        self.lock().clone()
    }

    pub fn view(&self) -> Screen {
        let state = self.lock();
        Screen {
            view: match &state.result {
                Some(result) => View::Result(result.clone()),
                None => View::Empty,
            },
            error_banner: state.error.clone(),
            is_loading: state.is_loading,
            can_submit: state.can_submit(),
        }
    }

    /// Run one synthesis: encode files, build the prompt, call the service
    /// once, parse the reply, and store the result or the error.
    pub async fn submit(&self) -> SubmitOutcome {
        let (topic, abstracts, files) = {
            let mut state = self.lock();
            if state.is_loading {
                return SubmitOutcome::Rejected(RejectReason::AlreadySubmitting);
            }
            if !state.has_input() {
                return SubmitOutcome::Rejected(RejectReason::EmptyInput);
            }
            state.begin_submission();
            (
                state.topic.clone(),
                state.abstracts.clone(),
                state.files.as_slice().to_vec(),
            )
        };
        info!(
            phase = %Phase::Submitting,
            files = files.len(),
            model = self.client.model_name(),
            "Starting synthesis"
        );

        match self.synthesize(&topic, &abstracts, &files).await {
            Ok(result) => {
                self.lock().succeed(result);
                info!(phase = %Phase::Succeeded, "Synthesis complete");
                SubmitOutcome::Succeeded
            }
            Err(e) => {
                let message = e.user_message();
                warn!(phase = %Phase::Failed, error = %e, "Synthesis failed");
                self.lock().fail(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    async fn synthesize(
        &self,
        topic: &str,
        abstracts: &str,
        files: &[UploadedFile],
    ) -> Result<AnalysisResult> {
        let prompt = build_prompt(topic, abstracts);
        let request = CompletionRequest {
            system: prompt.system,
            files: files::encode_all(files),
            user: prompt.user,
        };
        let response = self.client.complete(request).await?;
        parse_analysis(&response.text).map_err(|e| {
            warn!(
                error = %e,
                raw_response = response.text.as_str(),
                "Could not decode model response"
            );
            GapHunterError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCompletionClient;
    use crate::error::{CompletionError, SYNTHESIS_FAILED_MESSAGE};
    use pretty_assertions::assert_eq;

    fn orchestrator(client: Arc<MockCompletionClient>) -> Orchestrator {
        Orchestrator::new(client)
    }

    fn reply() -> String {
        MockCompletionClient::analysis_reply("Nobody has combined A with B.", "graph TD\nA-->B")
    }

    fn file(name: &str) -> UploadedFile {
        UploadedFile::new(name, "application/pdf", vec![1, 2, 3])
    }

    #[test]
    fn test_submit_gating() {
        let orch = orchestrator(Arc::new(MockCompletionClient::new()));
        assert!(!orch.can_submit());

        orch.set_topic("LLMs");
        assert!(orch.can_submit());
        orch.set_topic("");
        assert!(!orch.can_submit());

        orch.set_abstracts(" ");
        assert!(orch.can_submit());
        orch.set_abstracts("");

        orch.append_files(vec![file("a.pdf")]);
        assert!(orch.can_submit());
    }

    #[tokio::test]
    async fn test_empty_submit_is_rejected_without_request() {
        let client = Arc::new(MockCompletionClient::with_response(&reply()));
        let orch = orchestrator(client.clone());
        assert_eq!(
            orch.submit().await,
            SubmitOutcome::Rejected(RejectReason::EmptyInput)
        );
        assert_eq!(client.call_count(), 0);
        assert_eq!(orch.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_successful_submit_sets_result_only() {
        let client = Arc::new(MockCompletionClient::with_response(&reply()));
        let orch = orchestrator(client.clone());
        orch.set_topic("Graph neural networks");

        assert_eq!(orch.submit().await, SubmitOutcome::Succeeded);
        let state = orch.snapshot();
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        let result = state.result.expect("result should be set");
        assert_eq!(result.gap_analysis, "Nobody has combined A with B.");
        assert_eq!(orch.phase(), Phase::Succeeded);
    }

    #[tokio::test]
    async fn test_failed_submit_sets_error_only() {
        let client = Arc::new(MockCompletionClient::new());
        client.queue_response(&reply());
        client.queue_error(CompletionError::QuotaExceeded {
            message: "Resource has been exhausted".into(),
        });
        let orch = orchestrator(client.clone());
        orch.set_topic("t");

        assert_eq!(orch.submit().await, SubmitOutcome::Succeeded);
        assert_eq!(
            orch.submit().await,
            SubmitOutcome::Failed("Resource has been exhausted".into())
        );
        let state = orch.snapshot();
        assert!(state.result.is_none());
        assert_eq!(state.error.as_deref(), Some("Resource has been exhausted"));
        assert_eq!(orch.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_generic_failure() {
        let client = Arc::new(MockCompletionClient::with_response(
            "I'm sorry, I can't help with that.",
        ));
        let orch = orchestrator(client);
        orch.set_abstracts("some abstract");

        assert_eq!(
            orch.submit().await,
            SubmitOutcome::Failed(SYNTHESIS_FAILED_MESSAGE.into())
        );
    }

    #[tokio::test]
    async fn test_error_keeps_inputs_and_dismiss_returns_to_idle() {
        let client = Arc::new(MockCompletionClient::with_response("no json"));
        let orch = orchestrator(client);
        orch.set_topic("topic");
        orch.set_abstracts("abstracts");
        orch.append_files(vec![file("a.pdf")]);

        orch.submit().await;
        assert_eq!(orch.phase(), Phase::Failed);

        orch.dismiss_error();
        let state = orch.snapshot();
        assert_eq!(orch.phase(), Phase::Idle);
        assert_eq!(state.topic, "topic");
        assert_eq!(state.abstracts, "abstracts");
        assert_eq!(state.files.len(), 1);
        assert!(state.can_submit());
    }

    #[tokio::test]
    async fn test_concurrent_submits_issue_one_request() {
        let client = Arc::new(MockCompletionClient::with_response(&reply()));
        let orch = orchestrator(client.clone());
        orch.set_topic("t");

        let (first, second) = tokio::join!(orch.submit(), orch.submit());
        assert_eq!(first, SubmitOutcome::Succeeded);
        assert_eq!(
            second,
            SubmitOutcome::Rejected(RejectReason::AlreadySubmitting)
        );
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_prompt_and_files_in_order() {
        let client = Arc::new(MockCompletionClient::with_response(&reply()));
        let orch = orchestrator(client.clone());
        orch.set_topic("Quantum sensing");
        orch.append_files(vec![
            UploadedFile::new("a.pdf", "application/pdf", b"A".to_vec()),
            UploadedFile::new("b.txt", "text/plain", b"B".to_vec()),
        ]);

        orch.submit().await;
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.user.contains("Research Topic: Quantum sensing"));
        assert_eq!(request.files.len(), 2);
        assert_eq!(request.files[0].media_type, "application/pdf");
        assert_eq!(request.files[0].data, "QQ==");
        assert_eq!(request.files[1].data, "Qg==");
    }

    #[tokio::test]
    async fn test_screen_projection() {
        let client = Arc::new(MockCompletionClient::with_response(&reply()));
        let orch = orchestrator(client);
        let screen = orch.view();
        assert_eq!(screen.view, View::Empty);
        assert!(!screen.can_submit);

        orch.set_topic("t");
        orch.submit().await;
        let screen = orch.view();
        assert!(matches!(screen.view, View::Result(_)));
        assert!(screen.error_banner.is_none());
        assert!(!screen.is_loading);
    }

    #[tokio::test]
    async fn test_add_files_then_remove_middle() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = ["a.pdf", "b.pdf", "c.pdf"]
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                std::fs::write(&path, name).unwrap();
                path
            })
            .collect();
        let orch = orchestrator(Arc::new(MockCompletionClient::new()));

        assert_eq!(orch.add_files(&paths).await.unwrap(), 3);
        orch.remove_file(1).unwrap();
        assert_eq!(orch.snapshot().files.names(), vec!["a.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn test_add_files_failure_appends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.pdf");
        std::fs::write(&good, "x").unwrap();
        let orch = orchestrator(Arc::new(MockCompletionClient::new()));

        let err = orch
            .add_files(&[good, dir.path().join("missing.pdf")])
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
        assert!(orch.snapshot().files.is_empty());
    }
}
