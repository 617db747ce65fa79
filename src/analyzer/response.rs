//! Parsing of model output into annotation candidates.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::annotations::AnnotationCandidate;

/// Maximum annotations accepted from one analysis response.
pub const MAX_ANNOTATIONS: usize = 5;

/// Outermost JSON object in free-form model text.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON object pattern"));

#[derive(Debug, Deserialize)]
struct ModelResponse {
    annotations: Vec<AnnotationCandidate>,
}

/// Parse a model response into validated candidates.
///
/// The model may wrap its JSON in prose or code fences; the outermost `{...}`
/// is extracted. A response that is not valid JSON, or whose fields have the
/// wrong types, yields nothing at all. Individually degenerate candidates
/// (bad offsets, blank text) are dropped and the rest kept, up to
/// [`MAX_ANNOTATIONS`].
pub fn parse_annotation_response(response: &str, code_len: usize) -> Vec<AnnotationCandidate> {
    let Some(json) = JSON_OBJECT.find(response) else {
        debug!("No JSON object in annotation response");
        return Vec::new();
    };

    let parsed: ModelResponse = match serde_json::from_str(json.as_str()) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Discarding malformed annotation response: {}", e);
            return Vec::new();
        }
    };

    parsed
        .annotations
        .into_iter()
        .filter(|c| c.is_valid_for(code_len))
        .take(MAX_ANNOTATIONS)
        .collect()
}
