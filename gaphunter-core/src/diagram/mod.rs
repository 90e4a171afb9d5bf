//! # Diagram rendering
//!
//! Sanitizes the model's Mermaid flowchart source and renders it through an
//! external renderer, degrading to a plain-text fallback when the source is
//! rejected.

pub mod renderer;
pub mod sanitize;
pub mod view;

pub use renderer::{
    DiagramRenderer, MermaidCliRenderer, MockDiagramRenderer, RenderedDiagram, render_id,
};
pub use sanitize::sanitize_mermaid;
pub use view::{DiagramState, DiagramView};
