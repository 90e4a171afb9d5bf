//! Terminal presentation of the application state.
//!
//! Pure functions from state to text; the REPL decides when to print them.

use gaphunter_core::diagram::{DiagramState, RenderedDiagram};
use gaphunter_core::orchestrator::{Phase, UiState};
use gaphunter_core::types::AnalysisResult;
use std::path::{Path, PathBuf};
use textwrap::Options;

/// Column width used when wrapping prose.
pub const WRAP_WIDTH: usize = 88;

fn wrap(text: &str, indent: &str) -> String {
    let options = Options::new(WRAP_WIDTH)
        .initial_indent(indent)
        .subsequent_indent(indent);
    textwrap::fill(text, options)
}

fn heading(title: &str) -> String {
    format!("\x1b[1;36m{}\x1b[0m", title)
}

/// The idle main pane shown before any result exists.
pub fn render_empty_state() -> String {
    format!(
        "\n  \x1b[1mReady to Hunt\x1b[0m\n\x1b[90m{}\x1b[0m\n",
        wrap(
            "Enter a research topic and upload papers on the left to begin your gap analysis.",
            "  "
        )
    )
}

/// The dismissible error banner.
pub fn render_error_banner(message: &str) -> String {
    format!(
        "\n\x1b[1;31m  Error\x1b[0m\n\x1b[31m{}\x1b[0m\n\x1b[90m  (/dismiss to clear)\x1b[0m\n",
        wrap(message, "  ")
    )
}

/// Gap analysis and proposal. Methodology is shown one step per line.
pub fn render_result(result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", heading("The Gap Analysis")));
    out.push_str(&wrap(&result.gap_analysis, "  "));
    out.push('\n');

    out.push_str(&format!("\n{}\n", heading("Research Proposal")));
    out.push_str(&format!("  \x1b[1m{}\x1b[0m\n", result.proposal.title));
    out.push_str(&wrap(&result.proposal.abstract_text, "  "));
    out.push('\n');

    out.push_str(&format!("\n{}\n", heading("Methodology")));
    for step in result.proposal.methodology.split('\n') {
        out.push_str(&wrap(step, "  "));
        out.push('\n');
    }
    out
}

/// The diagram section for a settled diagram state.
///
/// `saved` is where the rendered SVG was written, when it was.
pub fn render_diagram_section(state: &DiagramState, saved: Option<&Path>) -> String {
    let mut out = format!("\n{}\n", heading("Visual Concept"));
    match state {
        DiagramState::NoDiagram => {
            out.push_str("  No Diagram Generated\n");
            out.push_str(
                "\x1b[90m  The model did not return a valid flowchart for this run.\x1b[0m\n",
            );
        }
        DiagramState::Pending => out.push_str("\x1b[90m  Rendering...\x1b[0m\n"),
        DiagramState::Rendered(rendered) => match saved {
            Some(path) => out.push_str(&format!("  Diagram saved to {}\n", path.display())),
            None => out.push_str(&format!(
                "  Diagram {} rendered ({} bytes of SVG) but could not be saved\n",
                rendered.id,
                rendered.svg.len()
            )),
        },
        DiagramState::SyntaxError { source } => {
            out.push_str("\x1b[33m  Diagram Syntax Error\x1b[0m\n");
            for line in source.lines() {
                out.push_str(&format!("\x1b[90m    {}\x1b[0m\n", line));
            }
        }
    }
    out
}

/// Write a rendered diagram to `<output_dir>/<id>.svg`.
pub fn save_svg(output_dir: &Path, rendered: &RenderedDiagram) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.svg", rendered.id));
    std::fs::write(&path, &rendered.svg)?;
    Ok(path)
}

/// Numbered file list, 1-based.
pub fn render_files(state: &UiState) -> String {
    if state.files.is_empty() {
        return "  No files added.\n".to_string();
    }
    state
        .files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            format!(
                "  {:>2}. {} \x1b[90m({}, {} bytes)\x1b[0m\n",
                i + 1,
                file.name,
                file.media_type,
                file.size()
            )
        })
        .collect()
}

/// One-screen summary of the inputs and current phase.
pub fn render_status(state: &UiState, model: &str) -> String {
    let phase = state.phase();
    let phase_label = match phase {
        Phase::Submitting => format!("\x1b[33m{}\x1b[0m", phase),
        Phase::Failed => format!("\x1b[31m{}\x1b[0m", phase),
        Phase::Succeeded => format!("\x1b[32m{}\x1b[0m", phase),
        Phase::Idle => phase.to_string(),
    };
    let topic = if state.topic.is_empty() {
        "(none)".to_string()
    } else {
        state.topic.clone()
    };
    format!(
        "  Phase: {} | Model: {}\n  Topic: {}\n  Abstracts: {} chars\n  Files: {}\n  Ready to submit: {}\n",
        phase_label,
        model,
        topic,
        state.abstracts.chars().count(),
        state.files.len(),
        if state.can_submit() { "yes" } else { "no" },
    )
}
