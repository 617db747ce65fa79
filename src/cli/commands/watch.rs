//! Live annotation session over a file on disk.

use std::path::{Path, PathBuf};

use console::style;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::annotations::{AnnotationSession, AnnotationSnapshot};
use crate::cli::icons::{arrow, success, warning};
use crate::config::Config;

use super::helpers::{build_analyzer, print_annotation};

/// Follow `file`, feeding every change into an annotation session and
/// printing each published state.
pub async fn cmd_watch(
    config: &Config,
    file: &Path,
    context: Option<String>,
    remote: Option<&str>,
) -> anyhow::Result<()> {
    let analyzer = build_analyzer(config, remote)?;
    if !analyzer.is_available().await {
        println!(
            "{} Analyzer {} is not reachable; edits will keep existing annotations only",
            warning(),
            analyzer.name()
        );
    }

    let session = AnnotationSession::new(analyzer, config.annotations.session_options(context));
    let mut snapshots = session.subscribe();

    let (_watcher, mut changes) = watch_file(file)?;
    println!(
        "{} Watching {} (Ctrl+C to stop)",
        arrow(),
        style(file.display()).bold()
    );

    let initial = read_pattern(file).await?;
    session.handle_code_change(&initial).await;
    session.trigger_analysis().await;

    let mut last_seen = initial;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            change = changes.recv() => {
                if change.is_none() {
                    break;
                }
                // Editors often write in several steps; coalesce queued events.
                while changes.try_recv().is_ok() {}
                match read_pattern(file).await {
                    Ok(code) if code != last_seen => {
                        session.handle_code_change(&code).await;
                        last_seen = code;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("{}", e),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_snapshot(&session.code().await, &snapshot);
            }
            _ = &mut ctrl_c => {
                println!();
                println!("{} Stopped", arrow());
                break;
            }
        }
    }

    Ok(())
}

/// Watch the directory holding `file` and forward a notification whenever
/// `file` is created or modified.
///
/// The parent directory is watched rather than the file itself so that
/// editors which save by renaming a temporary file over it keep reporting.
/// The watcher stops when the returned handle is dropped.
pub(crate) fn watch_file(
    file: &Path,
) -> anyhow::Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>)> {
    let name = file
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| anyhow::anyhow!("{} is not a file path", file.display()))?;
    let dir: PathBuf = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        match res {
            Ok(event) => {
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }
                if event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(name.as_os_str()))
                {
                    let _ = tx.send(());
                }
            }
            Err(e) => tracing::warn!("File watcher error: {}", e),
        }
    })
    .map_err(|e| anyhow::anyhow!("Failed to start file watcher: {}", e))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| anyhow::anyhow!("Failed to watch {}: {}", dir.display(), e))?;

    Ok((watcher, rx))
}

async fn read_pattern(file: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))
}

fn print_snapshot(code: &str, snapshot: &AnnotationSnapshot) {
    if !snapshot.enabled {
        return;
    }
    if snapshot.is_analyzing {
        println!("{} Analyzing...", style("…").dim());
        return;
    }

    let stamp = snapshot
        .last_analyzed_at
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    println!(
        "{} {} annotation{} {}",
        success(),
        snapshot.annotations.len(),
        if snapshot.annotations.len() == 1 { "" } else { "s" },
        style(format!("(analyzed {})", stamp)).dim()
    );
    for annotation in &snapshot.annotations {
        print_annotation(code, annotation);
    }
}
