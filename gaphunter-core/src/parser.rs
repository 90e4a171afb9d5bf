//! Decoding of the model's free-text reply into an [`AnalysisResult`].
//!
//! The reply is expected to hold one JSON object but may carry commentary
//! around it. The span from the first `{` to the last `}` is taken as the
//! candidate and decoded strictly; no alternative strategies are tried.

use crate::error::ParseError;
use crate::types::AnalysisResult;
use serde_json::error::Category;

/// Return the greedy `{ ... }` span of `text`, if one exists.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Decode a model reply into an analysis result.
///
/// When no span is found the raw text is decoded as-is, which fails unless
/// the text is itself valid; that failure is reported as `NoJsonObject`.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, ParseError> {
    match extract_json_span(text) {
        Some(span) => serde_json::from_str(span).map_err(classify),
        None => serde_json::from_str(text).map_err(|e| ParseError::NoJsonObject {
            message: e.to_string(),
        }),
    }
}

fn classify(err: serde_json::Error) -> ParseError {
    match err.classify() {
        Category::Data => ParseError::Schema {
            message: err.to_string(),
        },
        Category::Syntax | Category::Eof | Category::Io => ParseError::Malformed {
            message: err.to_string(),
        },
    }
}
