//! Lifecycle of the diagram section of a result view.
//!
//! A view is mounted with the raw `mermaidCode` of one result. Empty code
//! settles immediately on [`DiagramState::NoDiagram`]. Otherwise a render
//! attempt runs on a spawned task: sanitize, yield one scheduler turn so the
//! caller finishes mounting, render with a fresh id, then publish. Each
//! attempt holds a child of the view's cancellation token; dropping the view
//! or starting a new attempt cancels it, and a cancelled attempt never
//! publishes.

use super::renderer::{DiagramRenderer, RenderedDiagram, render_id};
use super::sanitize::sanitize_mermaid;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What the diagram section currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramState {
    /// The result carries no flowchart; the renderer is never invoked.
    NoDiagram,
    /// A render attempt is in flight.
    Pending,
    /// The latest attempt succeeded.
    Rendered(RenderedDiagram),
    /// The renderer rejected the diagram. Holds the original, unsanitized code.
    SyntaxError { source: String },
}

impl DiagramState {
    pub fn is_pending(&self) -> bool {
        matches!(self, DiagramState::Pending)
    }
}

/// The diagram section of one displayed result.
pub struct DiagramView {
    code: String,
    renderer: Arc<dyn DiagramRenderer>,
    lifetime: CancellationToken,
    attempt: Option<CancellationToken>,
    tx: watch::Sender<DiagramState>,
    rx: watch::Receiver<DiagramState>,
}

impl DiagramView {
    /// Mount a view for `code`, starting a render if there is anything to draw.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(code: impl Into<String>, renderer: Arc<dyn DiagramRenderer>) -> Self {
        let code = code.into();
        let initial = if code.is_empty() {
            DiagramState::NoDiagram
        } else {
            DiagramState::Pending
        };
        let (tx, rx) = watch::channel(initial);
        let mut view = Self {
            code,
            renderer,
            lifetime: CancellationToken::new(),
            attempt: None,
            tx,
            rx,
        };
        if !view.code.is_empty() {
            view.start_attempt();
        }
        view
    }

    /// Render again with a new id; a still-running previous attempt is discarded.
    pub fn refresh(&mut self) {
        if self.code.is_empty() {
            return;
        }
        if let Some(previous) = self.attempt.take() {
            previous.cancel();
        }
        self.tx.send_replace(DiagramState::Pending);
        self.start_attempt();
    }

    /// The state as of now.
    pub fn state(&self) -> DiagramState {
        self.rx.borrow().clone()
    }

    /// A receiver that observes every published state.
    pub fn subscribe(&self) -> watch::Receiver<DiagramState> {
        self.rx.clone()
    }

    /// Wait until the current attempt has published a final state.
    pub async fn settled(&self) -> DiagramState {
        let mut rx = self.rx.clone();
        match rx.wait_for(|state| !state.is_pending()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    fn start_attempt(&mut self) {
        if let Some(previous) = self.attempt.take() {
            previous.cancel();
        }
        let token = self.lifetime.child_token();
        self.attempt = Some(token.clone());

        let renderer = Arc::clone(&self.renderer);
        let code = self.code.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let sanitized = sanitize_mermaid(&code);
            tokio::task::yield_now().await;
            if token.is_cancelled() {
                debug!("Diagram view torn down before render started");
                return;
            }

            let id = render_id();
            let outcome = renderer.render(&id, &sanitized).await;
            if token.is_cancelled() {
                debug!(id = id.as_str(), "Discarding render for a torn-down view");
                return;
            }

            let state = match outcome {
                Ok(rendered) => DiagramState::Rendered(rendered),
                Err(e) => {
                    warn!(id = id.as_str(), error = %e, "Mermaid rendering failed");
                    DiagramState::SyntaxError { source: code }
                }
            };
            // Liveness is re-checked under the channel lock.
            tx.send_if_modified(|current| {
                if token.is_cancelled() {
                    return false;
                }
                *current = state;
                true
            });
        });
    }
}

impl Drop for DiagramView {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
