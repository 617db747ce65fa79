//! Lunette - AI annotations for live-coded music patterns.
//!
//! Keeps short pedagogical notes attached to character ranges of a code
//! buffer, invalidating them as the buffer is edited and refreshing them from
//! an LLM-backed analyzer under a debounce and change-size policy.

pub mod analyzer;
pub mod annotations;
pub mod cli;
pub mod config;
pub mod llm;
pub mod server;
