//! Code analyzers that propose annotations.
//!
//! The annotation session only depends on the [`CodeAnalyzer`] trait; concrete
//! backends call an LLM directly or go through a Lunette server over HTTP.

mod llm;
mod remote;
mod response;

use async_trait::async_trait;
use thiserror::Error;

use crate::annotations::AnnotationCandidate;
use crate::llm::LlmError;

pub use llm::LlmAnalyzer;
pub use remote::RemoteAnalyzer;
pub use response::{parse_annotation_response, MAX_ANNOTATIONS};

/// A backend that proposes annotations for a code buffer.
#[async_trait]
pub trait CodeAnalyzer: Send + Sync {
    /// Human-readable name for logs and CLI output.
    fn name(&self) -> &str;

    /// Analyze `code` and return candidate annotations whose offsets refer to
    /// exactly the submitted text.
    async fn analyze(
        &self,
        code: &str,
        context: Option<&str>,
    ) -> Result<Vec<AnnotationCandidate>, AnalysisError>;

    /// Whether the backend is reachable right now.
    async fn is_available(&self) -> bool {
        true
    }
}

/// Errors that can occur while requesting an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        AnalysisError::Transport(e.to_string())
    }
}
