//! # GapHunter Core
//!
//! Core library for GapHunter, a research-gap assistant.
//! Provides file loading and encoding, prompt construction, the completion
//! client seam with its Gemini implementation, response parsing, Mermaid
//! diagram rendering, configuration, and the submit orchestrator.

pub mod client;
pub mod config;
pub mod diagram;
pub mod error;
pub mod files;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod providers;
pub mod types;

// Re-export commonly used types at the crate root.
pub use client::{CompletionClient, MockCompletionClient};
pub use config::{AppConfig, DiagramConfig, FilesConfig, LlmConfig};
pub use diagram::{
    DiagramRenderer, DiagramState, DiagramView, MermaidCliRenderer, MockDiagramRenderer,
    RenderedDiagram,
};
pub use error::{
    CompletionError, ConfigError, DiagramError, FileError, GapHunterError, ParseError, Result,
};
pub use files::FileList;
pub use orchestrator::{Orchestrator, Phase, RejectReason, Screen, SubmitOutcome, UiState, View};
pub use parser::parse_analysis;
pub use prompt::build_prompt;
pub use providers::{GeminiClient, create_client};
pub use types::{
    AnalysisResult, CompletionRequest, CompletionResponse, EncodedFilePart, Proposal, TokenUsage,
    UploadedFile,
};
