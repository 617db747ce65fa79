//! HTTP API for annotation analysis.
//!
//! Exposes the configured analyzer to editors that cannot call an LLM
//! themselves:
//! - `POST /api/annotations` analyzes a buffer and returns annotations
//! - `GET /api/health` reports whether the analyzer backend is reachable

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::analyzer::{CodeAnalyzer, LlmAnalyzer};
use crate::config::{AnnotationsConfig, Config};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<dyn CodeAnalyzer>,
    pub annotations: AnnotationsConfig,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let analyzer = LlmAnalyzer::new(config.llm.clone())?;
        Ok(Self::with_analyzer(
            Arc::new(analyzer),
            config.annotations.clone(),
        ))
    }

    pub fn with_analyzer(analyzer: Arc<dyn CodeAnalyzer>, annotations: AnnotationsConfig) -> Self {
        Self {
            analyzer,
            annotations,
        }
    }
}

/// Start the web server.
pub async fn serve(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
