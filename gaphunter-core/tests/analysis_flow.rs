//! Integration tests for the GapHunter analysis flow.
//!
//! These drive the orchestrator end-to-end with MockCompletionClient and
//! mount the diagram view of the stored result with MockDiagramRenderer.

use gaphunter_core::client::MockCompletionClient;
use gaphunter_core::config::LlmConfig;
use gaphunter_core::diagram::{DiagramState, DiagramView, MockDiagramRenderer};
use gaphunter_core::error::{CompletionError, SYNTHESIS_FAILED_MESSAGE};
use gaphunter_core::orchestrator::{Orchestrator, Phase, SubmitOutcome, View};
use gaphunter_core::providers::GeminiClient;
use std::path::PathBuf;
use std::sync::Arc;

fn write_files(dir: &std::path::Path, names: &[(&str, &str)]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|(name, body)| {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            path
        })
        .collect()
}

#[tokio::test]
async fn test_files_and_text_reach_the_service() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_files(dir.path(), &[("paper.pdf", "%PDF-1.4"), ("notes.txt", "hi")]);

    let client = Arc::new(MockCompletionClient::with_response(
        &MockCompletionClient::analysis_reply("A gap", "graph TD\nA[One]-->B[Two]"),
    ));
    let orch = Orchestrator::new(client.clone())
        .with_accepted_extensions(vec![".pdf".into(), ".txt".into()]);
    orch.set_topic("Federated learning");
    orch.set_abstracts("Abstract one.\n\nAbstract two.");
    orch.add_files(&paths).await.unwrap();

    assert_eq!(orch.submit().await, SubmitOutcome::Succeeded);

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.system.contains("Research Gap"));
    assert!(request.user.contains("Research Topic: Federated learning"));
    assert!(request.user.contains("Abstract one.\n\nAbstract two."));
    let media: Vec<&str> = request.files.iter().map(|f| f.media_type.as_str()).collect();
    assert_eq!(media, vec!["application/pdf", "text/plain"]);
    assert_eq!(request.files[1].data, "aGk=");
}

#[tokio::test]
async fn test_result_diagram_renders_sanitized() {
    let client = Arc::new(MockCompletionClient::with_response(
        &MockCompletionClient::analysis_reply("gap", "```mermaid\ngraph TD\nA[Start]-->B[End]\n```"),
    ));
    let orch = Orchestrator::new(client);
    orch.set_topic("t");
    orch.submit().await;

    let View::Result(result) = orch.view().view else {
        panic!("expected a result view");
    };
    let renderer = Arc::new(MockDiagramRenderer::new());
    let view = DiagramView::mount(result.mermaid_code.clone(), renderer.clone());

    assert!(matches!(view.settled().await, DiagramState::Rendered(_)));
    assert_eq!(
        renderer.sources(),
        vec!["graph TD\nA[\"Start\"]-->B[\"End\"]".to_string()]
    );
}

#[tokio::test]
async fn test_result_without_diagram_shows_placeholder() {
    let client = Arc::new(MockCompletionClient::with_response(
        &MockCompletionClient::analysis_reply("gap", ""),
    ));
    let orch = Orchestrator::new(client);
    orch.set_topic("t");
    orch.submit().await;

    let result = orch.snapshot().result.unwrap();
    assert!(!result.has_diagram());
    let renderer = Arc::new(MockDiagramRenderer::new());
    let view = DiagramView::mount(result.mermaid_code, renderer.clone());
    assert_eq!(view.settled().await, DiagramState::NoDiagram);
    assert_eq!(renderer.call_count(), 0);
}

#[tokio::test]
async fn test_missing_fields_fail_generically() {
    let client = Arc::new(MockCompletionClient::with_response(
        r#"{"gapAnalysis": "only this"}"#,
    ));
    let orch = Orchestrator::new(client);
    orch.set_topic("t");

    assert_eq!(
        orch.submit().await,
        SubmitOutcome::Failed(SYNTHESIS_FAILED_MESSAGE.to_string())
    );
    assert_eq!(orch.phase(), Phase::Failed);
}

#[tokio::test]
async fn test_retry_after_failure_replaces_error_with_result() {
    let client = Arc::new(MockCompletionClient::with_response(
        &MockCompletionClient::analysis_reply("gap", "graph TD\nA-->B"),
    ));
    client.queue_error(CompletionError::ApiRequest {
        message: "Internal error encountered.".into(),
    });
    let orch = Orchestrator::new(client.clone());
    orch.set_topic("t");

    assert_eq!(
        orch.submit().await,
        SubmitOutcome::Failed("Internal error encountered.".into())
    );
    assert_eq!(orch.submit().await, SubmitOutcome::Succeeded);
    let screen = orch.view();
    assert!(screen.error_banner.is_none());
    assert!(matches!(screen.view, View::Result(_)));
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_missing_api_key_is_reported_without_network() {
    let config = LlmConfig {
        api_key_env: "GAPHUNTER_TEST_UNSET_KEY_VAR".into(),
        // Unroutable; a request here would fail with a connection error instead.
        base_url: Some("http://127.0.0.1:9".into()),
        ..LlmConfig::default()
    };
    let client = GeminiClient::new(&config).unwrap();
    assert!(!client.has_api_key());

    let orch = Orchestrator::new(Arc::new(client));
    orch.set_topic("t");
    assert_eq!(
        orch.submit().await,
        SubmitOutcome::Failed(
            "API key is missing. Please add GAPHUNTER_TEST_UNSET_KEY_VAR to your environment or .env file."
                .into()
        )
    );
}
