//! Analyzer that delegates to a Lunette server over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{AnalysisError, CodeAnalyzer};
use crate::annotations::{AnnotationCandidate, AnnotationRequest};

/// Calls `POST {base_url}/api/annotations`.
pub struct RemoteAnalyzer {
    base_url: String,
    client: Client,
}

/// Server response; ids in the payload are ignored.
#[derive(Debug, Deserialize)]
struct RemoteResponse {
    annotations: Vec<AnnotationCandidate>,
}

impl RemoteAnalyzer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CodeAnalyzer for RemoteAnalyzer {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn analyze(
        &self,
        code: &str,
        context: Option<&str>,
    ) -> Result<Vec<AnnotationCandidate>, AnalysisError> {
        let url = format!("{}/api/annotations", self.base_url);
        let body = AnnotationRequest {
            code: code.to_string(),
            context: context.map(str::to_string),
        };

        debug!("POST {}", url);
        let resp = self.client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Status { status, body });
        }

        let parsed: RemoteResponse = resp
            .json()
            .await
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        Ok(parsed.annotations)
    }

    async fn is_available(&self) -> bool {
        #[derive(Deserialize)]
        struct Health {
            llm_available: bool,
        }

        let url = format!("{}/api/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp
                .json::<Health>()
                .await
                .map(|h| h.llm_available)
                .unwrap_or(false),
            _ => false,
        }
    }
}
