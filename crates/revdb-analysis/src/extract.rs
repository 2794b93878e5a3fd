//! Locating the JSON object inside a free-form model response.

use crate::error::AnalysisError;

const PREVIEW_CHARS: usize = 200;

/// Returns the span from the first `{` to the last `}` of `response`.
///
/// Models often wrap the object in prose or code fences; anything outside
/// the outermost braces is ignored.
///
/// # Errors
///
/// Returns [`AnalysisError::NoJsonObject`] when either brace is missing or
/// the last `}` comes before the first `{`.
pub fn extract_json_object(response: &str) -> Result<&str, AnalysisError> {
    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&response[start..=end]),
        _ => Err(AnalysisError::NoJsonObject {
            preview: response.chars().take(PREVIEW_CHARS).collect(),
        }),
    }
}
