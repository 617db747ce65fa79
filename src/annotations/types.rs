//! Annotation data types.
//!
//! Annotations are short pedagogical insights attached to a character range of
//! the code buffer. Offsets count Unicode scalar values (`char`s), not bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an annotation, assigned locally when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(format!("ann_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pedagogical insight tied to the half-open range `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    /// Character offset start (inclusive).
    pub from: usize,
    /// Character offset end (exclusive).
    pub to: usize,
    /// Insight text.
    pub text: String,
    /// Optional concept tag from the pedagogy taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
}

impl Annotation {
    /// Create an annotation with a freshly generated id.
    pub fn new(from: usize, to: usize, text: impl Into<String>, concept: Option<String>) -> Self {
        Self {
            id: AnnotationId::generate(),
            from,
            to,
            text: text.into(),
            concept,
        }
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `offset` falls on this annotation, end inclusive (hover lookup).
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.from && offset <= self.to
    }

    /// Concept id rendered for display ("call-response" -> "call response").
    pub fn concept_label(&self) -> Option<String> {
        self.concept.as_ref().map(|c| c.replace('-', " "))
    }

    /// The covered text from `code`, if the range is in bounds.
    pub fn excerpt(&self, code: &str) -> Option<String> {
        if self.from >= self.to || self.to > code.chars().count() {
            return None;
        }
        Some(code.chars().skip(self.from).take(self.to - self.from).collect())
    }
}

/// Annotation as proposed by an analyzer, before validation and id assignment.
///
/// Offsets are signed so out-of-range values from the analyzer can be
/// recognised and rejected rather than failing deserialisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationCandidate {
    pub from: i64,
    pub to: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
}

impl AnnotationCandidate {
    pub fn new(from: i64, to: i64, text: impl Into<String>) -> Self {
        Self {
            from,
            to,
            text: text.into(),
            concept: None,
        }
    }

    pub fn with_concept(mut self, concept: impl Into<String>) -> Self {
        self.concept = Some(concept.into());
        self
    }

    /// Check offsets against a buffer of `code_len` characters and reject
    /// blank text.
    pub fn is_valid_for(&self, code_len: usize) -> bool {
        if self.from < 0 || self.from >= self.to || self.to > code_len as i64 {
            return false;
        }
        !self.text.trim().is_empty()
    }

    fn into_annotation(self) -> Annotation {
        Annotation::new(self.from as usize, self.to as usize, self.text, self.concept)
    }
}

/// Validate candidates against `code`, keep at most `max` of the valid ones
/// and assign ids. Invalid candidates are dropped individually.
pub fn accept_candidates(
    code: &str,
    candidates: Vec<AnnotationCandidate>,
    max: usize,
) -> Vec<Annotation> {
    let code_len = code.chars().count();
    candidates
        .into_iter()
        .filter(|c| c.is_valid_for(code_len))
        .take(max)
        .map(AnnotationCandidate::into_annotation)
        .collect()
}

/// Request body for an annotation analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Response body of an annotation analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationResponse {
    pub annotations: Vec<Annotation>,
}

/// Published view of a session, for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSnapshot {
    pub annotations: Vec<Annotation>,
    pub is_analyzing: bool,
    pub enabled: bool,
    /// When the last successful full analysis completed.
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

impl Default for AnnotationSnapshot {
    fn default() -> Self {
        Self {
            annotations: Vec::new(),
            is_analyzing: false,
            enabled: true,
            last_analyzed_at: None,
        }
    }
}
