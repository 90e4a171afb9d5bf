//! Cleanup of model-generated Mermaid source before rendering.
//!
//! The rewrite is a textual heuristic for the flowchart dialect the prompt
//! asks for, not a Mermaid grammar. Labels that themselves contain `]` or `"`
//! are left alone, and nested brackets are not handled.

use regex::Regex;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:mermaid)?").expect("fence pattern is valid"));

static UNQUOTED_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[([^"\]]+)\]"#).expect("label pattern is valid"));

/// Remove every "```mermaid" and bare "```" fence marker, wherever it appears.
pub fn strip_fences(code: &str) -> String {
    FENCE.replace_all(code, "").into_owned()
}

/// Wrap every unquoted `[label]` as `["label"]`.
pub fn quote_labels(code: &str) -> String {
    UNQUOTED_LABEL.replace_all(code, r#"["$1"]"#).into_owned()
}

/// Full sanitization pass: strip fences, trim, then quote labels.
pub fn sanitize_mermaid(code: &str) -> String {
    let stripped = strip_fences(code);
    quote_labels(stripped.trim())
}
