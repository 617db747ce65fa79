//! Shared helper functions for CLI commands.

use std::sync::Arc;
use std::time::Duration;

use console::style;

use crate::analyzer::{CodeAnalyzer, LlmAnalyzer, RemoteAnalyzer};
use crate::annotations::Annotation;
use crate::config::Config;

/// Build the analyzer for a command: a remote server when `remote` is given,
/// otherwise the configured LLM.
pub fn build_analyzer(
    config: &Config,
    remote: Option<&str>,
) -> anyhow::Result<Arc<dyn CodeAnalyzer>> {
    let analyzer: Arc<dyn CodeAnalyzer> = match remote {
        Some(url) => Arc::new(RemoteAnalyzer::new(
            url,
            Duration::from_secs(config.llm.request_timeout_secs),
        )?),
        None => Arc::new(LlmAnalyzer::new(config.llm.clone())?),
    };
    Ok(analyzer)
}

/// 1-based line and column of a character offset.
pub fn line_col(code: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for c in code.chars().take(offset) {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Print one annotation with its position and the code it covers.
pub fn print_annotation(code: &str, annotation: &Annotation) {
    let (line, col) = line_col(code, annotation.from);
    let excerpt = annotation
        .excerpt(code)
        .map(|e| truncate(&e.replace('\n', "⏎"), 40))
        .unwrap_or_default();

    println!(
        "{} {}",
        style(format!("{}:{}", line, col)).dim(),
        style(excerpt).cyan()
    );
    match annotation.concept_label() {
        Some(label) => println!("  {} {}", annotation.text, style(format!("[{}]", label)).magenta()),
        None => println!("  {}", annotation.text),
    }
}
