//! The diagram renderer seam.
//!
//! `MermaidCliRenderer` shells out to the Mermaid CLI (`mmdc`) and reads back
//! the SVG it produces. The renderer keeps per-id state, so every attempt
//! gets a fresh id from [`render_id`].

use crate::config::DiagramConfig;
use crate::error::DiagramError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;
use tracing::debug;

/// A successfully rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    /// The identifier the renderer was invoked with.
    pub id: String,
    /// SVG markup.
    pub svg: String,
}

/// Turns sanitized Mermaid source into a graphic, or reports a syntax failure.
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    async fn render(&self, id: &str, source: &str) -> Result<RenderedDiagram, DiagramError>;
}

/// A render identifier unique per attempt: `mermaid-<unix millis>-<9 random chars>`.
pub fn render_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("mermaid-{}-{}", millis, &random[..9])
}

/// Renders through the Mermaid CLI.
pub struct MermaidCliRenderer {
    command: String,
    theme: String,
    scratch_dir: PathBuf,
}

impl MermaidCliRenderer {
    pub fn new(config: &DiagramConfig) -> Self {
        Self {
            command: config.command.clone(),
            theme: config.theme.clone(),
            scratch_dir: config
                .scratch_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
        }
    }

    fn scratch_paths(&self, id: &str) -> (PathBuf, PathBuf) {
        (
            self.scratch_dir.join(format!("{id}.mmd")),
            self.scratch_dir.join(format!("{id}.svg")),
        )
    }
}

#[async_trait]
impl DiagramRenderer for MermaidCliRenderer {
    async fn render(&self, id: &str, source: &str) -> Result<RenderedDiagram, DiagramError> {
        let (input, output) = self.scratch_paths(id);
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        tokio::fs::write(&input, source).await?;

        debug!(id, command = self.command.as_str(), "Rendering diagram");
        let result = tokio::process::Command::new(&self.command)
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .args(["-I", id, "-t", self.theme.as_str(), "-q"])
            .output()
            .await;

        let rendered = match result {
            Err(e) => Err(DiagramError::Unavailable {
                message: format!("failed to run '{}': {}", self.command, e),
            }),
            Ok(out) if !out.status.success() => Err(DiagramError::Syntax {
                message: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            }),
            Ok(_) => tokio::fs::read_to_string(&output)
                .await
                .map(|svg| RenderedDiagram {
                    id: id.to_string(),
                    svg,
                })
                .map_err(DiagramError::from),
        };

        let _ = tokio::fs::remove_file(&input).await;
        let _ = tokio::fs::remove_file(&output).await;
        rendered
    }
}

/// A scripted renderer for tests.
///
/// Records every call. When gated, each render waits for [`release`](Self::release)
/// before answering.
pub struct MockDiagramRenderer {
    fail: bool,
    gate: Option<Notify>,
    calls: AtomicUsize,
    sources: Mutex<Vec<String>>,
    ids: Mutex<Vec<String>>,
}

impl MockDiagramRenderer {
    /// A renderer that succeeds immediately.
    pub fn new() -> Self {
        Self {
            fail: false,
            gate: None,
            calls: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
            ids: Mutex::new(Vec::new()),
        }
    }

    /// A renderer that reports a syntax error for every input.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// A renderer that blocks each render until released.
    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::new()
        }
    }

    /// Let one pending (or the next) gated render proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sanitized sources received, in call order.
    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }

    /// Render ids received, in call order.
    pub fn ids(&self) -> Vec<String> {
        self.ids.lock().unwrap().clone()
    }
}

impl Default for MockDiagramRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiagramRenderer for MockDiagramRenderer {
    async fn render(&self, id: &str, source: &str) -> Result<RenderedDiagram, DiagramError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().unwrap().push(source.to_string());
        self.ids.lock().unwrap().push(id.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(DiagramError::Syntax {
                message: "Parse error on line 2".to_string(),
            });
        }
        Ok(RenderedDiagram {
            id: id.to_string(),
            svg: format!("<svg id=\"{id}\"><!-- {} --></svg>", source.lines().count()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_id_format() {
        let id = render_id();
        let parts: Vec<&str> = id.splitn(3, '-').collect();
        assert_eq!(parts[0], "mermaid");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn test_render_ids_are_unique() {
        let ids: std::collections::HashSet<String> = (0..200).map(|_| render_id()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[tokio::test]
    async fn test_missing_command_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = MermaidCliRenderer::new(&DiagramConfig {
            command: "gaphunter-definitely-not-a-real-mmdc".into(),
            scratch_dir: Some(dir.path().to_path_buf()),
            ..DiagramConfig::default()
        });
        let err = renderer
            .render("mermaid-1-abc", "graph TD\nA-->B")
            .await
            .unwrap_err();
        assert!(matches!(err, DiagramError::Unavailable { .. }));
        // Scratch input is cleaned up even on failure.
        assert!(!dir.path().join("mermaid-1-abc.mmd").exists());
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let renderer = MockDiagramRenderer::failing();
        let err = renderer.render("id", "graph TD").await.unwrap_err();
        assert!(matches!(err, DiagramError::Syntax { .. }));
        assert_eq!(renderer.call_count(), 1);
    }
}
