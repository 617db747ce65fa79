//! Analyzer backed by an LLM.

use async_trait::async_trait;
use tracing::info;

use super::response::parse_annotation_response;
use super::{AnalysisError, CodeAnalyzer};
use crate::annotations::AnnotationCandidate;
use crate::llm::{LlmClient, LlmConfig, LlmError};

/// Proposes annotations by prompting an LLM.
pub struct LlmAnalyzer {
    client: LlmClient,
}

impl LlmAnalyzer {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: LlmClient::new(config)?,
        })
    }

    pub fn from_client(client: LlmClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }
}

#[async_trait]
impl CodeAnalyzer for LlmAnalyzer {
    fn name(&self) -> &str {
        &self.client.config().model
    }

    async fn analyze(
        &self,
        code: &str,
        context: Option<&str>,
    ) -> Result<Vec<AnnotationCandidate>, AnalysisError> {
        let response = self.client.generate_annotations(code, context).await?;
        let candidates = parse_annotation_response(&response, code.chars().count());
        info!(
            "{} proposed {} usable annotations",
            self.client.config().model,
            candidates.len()
        );
        Ok(candidates)
    }

    async fn is_available(&self) -> bool {
        self.client.is_available().await
    }
}
