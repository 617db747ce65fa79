//! Configuration management for Lunette using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::MAX_ANNOTATIONS;
use crate::annotations::trigger::{DEFAULT_IDLE_TIMEOUT, DEFAULT_MIN_CHANGE_THRESHOLD};
use crate::annotations::{SessionOptions, TriggerOptions};
use crate::llm::LlmConfig;

/// Default bind host for the HTTP API.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 3000;

/// Shortest trimmed buffer the HTTP API will send to the analyzer.
pub const DEFAULT_MIN_ANALYZABLE_CHARS: usize = 10;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

/// Annotation lifecycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationsConfig {
    /// Whether annotations start enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minimum change in buffer length before a non-manual trigger acts.
    #[serde(default = "default_min_change_threshold")]
    pub min_change_threshold: usize,
    /// Idle time after the last edit before an idle trigger, in milliseconds.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Maximum annotations accepted per analysis.
    #[serde(default = "default_max_annotations")]
    pub max_annotations: usize,
    /// Shortest trimmed buffer worth analyzing over HTTP.
    #[serde(default = "default_min_analyzable_chars")]
    pub min_analyzable_chars: usize,
    /// Drop analysis results for text that has since been edited.
    #[serde(default)]
    pub discard_stale_responses: bool,
}

fn default_true() -> bool {
    true
}

fn default_min_change_threshold() -> usize {
    DEFAULT_MIN_CHANGE_THRESHOLD
}

fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_millis() as u64
}

fn default_max_annotations() -> usize {
    MAX_ANNOTATIONS
}

fn default_min_analyzable_chars() -> usize {
    DEFAULT_MIN_ANALYZABLE_CHARS
}

impl Default for AnnotationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            min_change_threshold: default_min_change_threshold(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_annotations: default_max_annotations(),
            min_analyzable_chars: default_min_analyzable_chars(),
            discard_stale_responses: false,
        }
    }
}

impl AnnotationsConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn trigger_options(&self) -> TriggerOptions {
        TriggerOptions {
            min_change_threshold: self.min_change_threshold,
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
        }
    }

    /// Session options for a buffer analyzed with the given context.
    pub fn session_options(&self, context: Option<String>) -> SessionOptions {
        SessionOptions {
            trigger: self.trigger_options(),
            max_annotations: self.max_annotations,
            enabled: self.enabled,
            discard_stale_responses: self.discard_stale_responses,
            context,
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
        .with_env_overrides()
    }
}

impl ServerConfig {
    pub fn is_default(&self) -> bool {
        self.host == DEFAULT_HOST && self.port == DEFAULT_PORT
    }

    /// Apply `LUNETTE_HOST` / `LUNETTE_PORT`.
    pub fn with_env_overrides(self) -> Self {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_env_lookup(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(host) = var("LUNETTE_HOST").filter(|h| !h.is_empty()) {
            self.host = host;
        }
        if let Some(port) = var("LUNETTE_PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        self
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Annotation lifecycle settings.
    #[serde(default, skip_serializing_if = "AnnotationsConfig::is_default")]
    pub annotations: AnnotationsConfig,
    /// LLM backend used to generate annotations.
    #[serde(default, skip_serializing_if = "LlmConfig::is_default")]
    pub llm: LlmConfig,
    /// HTTP API settings.
    #[serde(default, skip_serializing_if = "ServerConfig::is_default")]
    pub server: ServerConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers lunette config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("lunette").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => Self::default_with_env(),
        }
    }

    /// Load from an explicit path when given, otherwise discover.
    pub async fn load_or_discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path).await,
            None => Ok(Self::load().await),
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            })?,
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            })?,
            _ => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            })?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_lookup(|key| std::env::var(key).ok()))
    }

    /// Explicit environment variables win over the file. Provider
    /// auto-detection only applies when the file has no `llm` section,
    /// in which case the section was built by `LlmConfig::default()`.
    fn with_env_lookup(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        self.llm = self.llm.with_explicit_env_lookup(&var);
        self.server = self.server.with_env_lookup(&var);
        self
    }

    /// Effective configuration as pretty JSON, including defaults.
    pub fn to_json_pretty(&self) -> String {
        #[derive(Serialize)]
        struct Effective<'a> {
            annotations: &'a AnnotationsConfig,
            llm: &'a LlmConfig,
            server: &'a ServerConfig,
        }

        serde_json::to_string_pretty(&Effective {
            annotations: &self.annotations,
            llm: &self.llm,
            server: &self.server,
        })
        .unwrap_or_default()
    }
}
