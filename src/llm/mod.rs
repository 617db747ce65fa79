//! LLM integration for code annotation.
//!
//! Uses a local LLM (via Ollama) or an OpenAI-compatible API to propose
//! annotations for a pattern.

mod client;

pub use client::{
    build_annotation_prompt, LlmClient, LlmConfig, LlmError, LlmProvider,
    ANNOTATION_SYSTEM_PROMPT, ANNOTATION_USER_MESSAGE,
};
