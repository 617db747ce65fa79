//! One-shot annotation command.

use std::path::Path;

use console::style;

use crate::annotations::{accept_candidates, AnnotationResponse};
use crate::cli::icons::{arrow, error, success, warning};
use crate::config::Config;

use super::helpers::{build_analyzer, print_annotation};

/// Analyze a pattern file once and print its annotations.
pub async fn cmd_annotate(
    config: &Config,
    file: &Path,
    context: Option<String>,
    remote: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let code = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;

    if code.trim().is_empty() {
        if json {
            println!("{}", serde_json::to_string_pretty(&AnnotationResponse::default())?);
        } else {
            println!("{} {} is empty, nothing to annotate", warning(), file.display());
        }
        return Ok(());
    }

    let analyzer = build_analyzer(config, remote)?;
    if !json {
        if !analyzer.is_available().await {
            println!("{} Analyzer not available: {}", error(), analyzer.name());
            return Ok(());
        }
        println!(
            "{} Analyzing {} with {}",
            arrow(),
            file.display(),
            analyzer.name()
        );
    }

    let candidates = analyzer.analyze(&code, context.as_deref()).await?;
    let annotations = accept_candidates(&code, candidates, config.annotations.max_annotations);

    if json {
        let response = AnnotationResponse { annotations };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if annotations.is_empty() {
        println!("{} No annotations for this pattern", warning());
        return Ok(());
    }

    println!(
        "{} {} annotation{}",
        success(),
        annotations.len(),
        if annotations.len() == 1 { "" } else { "s" }
    );
    for annotation in &annotations {
        println!();
        print_annotation(&code, annotation);
    }
    println!();
    println!("{}", style(file.display()).dim());

    Ok(())
}
