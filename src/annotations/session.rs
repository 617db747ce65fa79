//! Per-buffer annotation session.
//!
//! An [`AnnotationSession`] owns the annotation set for one editor buffer. The
//! editor calls [`AnnotationSession::handle_code_change`] on every mutation;
//! the session keeps annotations positionally valid, feeds the trigger policy
//! and requests full analyses from a [`CodeAnalyzer`] when the policy says so.
//! Every state change is published on a `watch` channel.

use std::sync::{Arc, Weak};

use chrono::Utc;
use tokio::sync::{mpsc, watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::diff::{invalidate_annotations, should_reanalyze};
use super::trigger::{should_trigger_analysis, TriggerEvent, TriggerHandler, TriggerOptions};
use super::types::{accept_candidates, Annotation, AnnotationSnapshot};
use crate::analyzer::{CodeAnalyzer, MAX_ANNOTATIONS};

/// Below this many remaining annotations a kept set counts as sparse.
const SPARSE_ANNOTATION_COUNT: usize = 2;

/// Trimmed buffers longer than this are worth re-analyzing when sparse.
const SPARSE_MIN_CODE_CHARS: usize = 30;

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub trigger: TriggerOptions,
    /// Maximum annotations accepted from one analysis.
    pub max_annotations: usize,
    /// Initial enabled state.
    pub enabled: bool,
    /// Drop analysis results whose request text no longer matches the buffer.
    pub discard_stale_responses: bool,
    /// Free-text context forwarded to the analyzer.
    pub context: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            trigger: TriggerOptions::default(),
            max_annotations: MAX_ANNOTATIONS,
            enabled: true,
            discard_stale_responses: false,
            context: None,
        }
    }
}

struct SessionState {
    code: String,
    last_analyzed_code: String,
    annotations: Vec<Annotation>,
    enabled: bool,
    in_flight: usize,
    last_analyzed_at: Option<chrono::DateTime<Utc>>,
    trigger: TriggerHandler,
}

impl SessionState {
    fn snapshot(&self) -> AnnotationSnapshot {
        AnnotationSnapshot {
            annotations: self.annotations.clone(),
            is_analyzing: self.in_flight > 0,
            enabled: self.enabled,
            last_analyzed_at: self.last_analyzed_at,
        }
    }
}

struct SessionInner {
    analyzer: Arc<dyn CodeAnalyzer>,
    options: SessionOptions,
    state: Mutex<SessionState>,
    snapshots: watch::Sender<AnnotationSnapshot>,
}

/// Annotation state for one buffer.
///
/// Must be created inside a Tokio runtime: the session spawns a task that
/// consumes trigger events, and each analysis runs on its own task.
pub struct AnnotationSession {
    inner: Arc<SessionInner>,
    driver: JoinHandle<()>,
}

impl AnnotationSession {
    pub fn new(analyzer: Arc<dyn CodeAnalyzer>, options: SessionOptions) -> Self {
        let (trigger, events) = TriggerHandler::channel(options.trigger);
        let state = SessionState {
            code: String::new(),
            last_analyzed_code: String::new(),
            annotations: Vec::new(),
            enabled: options.enabled,
            in_flight: 0,
            last_analyzed_at: None,
            trigger,
        };
        let (snapshots, _) = watch::channel(state.snapshot());

        let inner = Arc::new(SessionInner {
            analyzer,
            options,
            state: Mutex::new(state),
            snapshots,
        });
        let driver = tokio::spawn(drive(Arc::downgrade(&inner), events));

        Self { inner, driver }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.inner.options
    }

    /// Feed a new buffer snapshot. Call on every editor mutation.
    ///
    /// Annotations touched by the edit are dropped and later ones shifted
    /// before this returns; any analysis the change triggers runs in the
    /// background.
    pub async fn handle_code_change(&self, code: &str) {
        let mut state = self.inner.state.lock().await;
        let previous = std::mem::replace(&mut state.code, code.to_string());

        if state.enabled && previous != code && !state.annotations.is_empty() {
            let valid = invalidate_annotations(&state.annotations, &previous, code);
            if valid != state.annotations {
                debug!(
                    "Edit kept {} of {} annotations",
                    valid.len(),
                    state.annotations.len()
                );
                state.annotations = valid;
                self.inner.publish(&state);
            }
        }

        state.trigger.handle_change(code);
    }

    /// Request a full analysis of the current buffer now.
    ///
    /// Ignored while disabled. On a blank buffer the set is cleared without
    /// calling the analyzer.
    pub async fn trigger_analysis(&self) {
        let mut state = self.inner.state.lock().await;
        state.trigger.cancel_idle();

        if !state.enabled {
            return;
        }
        self.inner.start_analysis(&mut state);
    }

    /// Enable or disable annotations. Disabling clears the set immediately;
    /// results of analyses still in flight are dropped when they land.
    pub async fn set_enabled(&self, enabled: bool) {
        let mut state = self.inner.state.lock().await;
        if state.enabled == enabled {
            return;
        }
        state.enabled = enabled;
        if !enabled {
            state.trigger.cancel_idle();
            state.annotations.clear();
        }
        info!(
            "Annotations {}",
            if enabled { "enabled" } else { "disabled" }
        );
        self.inner.publish(&state);
    }

    /// Drop every annotation and forget the last analyzed text.
    pub async fn clear_annotations(&self) {
        let mut state = self.inner.state.lock().await;
        state.annotations.clear();
        state.last_analyzed_code.clear();
        self.inner.publish(&state);
    }

    pub async fn annotations(&self) -> Vec<Annotation> {
        self.inner.state.lock().await.annotations.clone()
    }

    pub async fn is_analyzing(&self) -> bool {
        self.inner.state.lock().await.in_flight > 0
    }

    pub async fn enabled(&self) -> bool {
        self.inner.state.lock().await.enabled
    }

    /// Current buffer text as last reported by the editor.
    pub async fn code(&self) -> String {
        self.inner.state.lock().await.code.clone()
    }

    /// First annotation covering `offset` (end inclusive, for hover lookup).
    pub async fn annotation_at(&self, offset: usize) -> Option<Annotation> {
        let state = self.inner.state.lock().await;
        state
            .annotations
            .iter()
            .find(|a| a.contains(offset))
            .cloned()
    }

    /// Annotations that fit the current buffer, ordered by start offset.
    pub async fn render_ranges(&self) -> Vec<Annotation> {
        let state = self.inner.state.lock().await;
        let len = state.code.chars().count();
        let mut ranges: Vec<Annotation> = state
            .annotations
            .iter()
            .filter(|a| a.from < a.to && a.to <= len)
            .cloned()
            .collect();
        ranges.sort_by_key(|a| a.from);
        ranges
    }

    pub async fn snapshot(&self) -> AnnotationSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    /// Receive every published state change.
    pub fn subscribe(&self) -> watch::Receiver<AnnotationSnapshot> {
        self.inner.snapshots.subscribe()
    }
}

impl Drop for AnnotationSession {
    fn drop(&mut self) {
        self.driver.abort();
        if let Ok(mut state) = self.inner.state.try_lock() {
            state.trigger.cancel_idle();
        }
    }
}

impl SessionInner {
    fn publish(&self, state: &MutexGuard<'_, SessionState>) {
        self.snapshots.send_replace(state.snapshot());
    }

    async fn on_trigger(self: &Arc<Self>, event: TriggerEvent) {
        let mut state = self.state.lock().await;
        if !state.enabled {
            return;
        }

        if !should_trigger_analysis(
            &state.code,
            &state.last_analyzed_code,
            event,
            &self.options.trigger,
        ) {
            debug!("Trigger {} suppressed", event);
            return;
        }

        if should_reanalyze(&state.last_analyzed_code, &state.code) {
            debug!("Trigger {}: full re-analysis", event);
            self.start_analysis(&mut state);
            return;
        }

        // The set was already invalidated edit by edit; only rebase.
        state.last_analyzed_code = state.code.clone();

        if state.annotations.len() < SPARSE_ANNOTATION_COUNT
            && state.code.trim().chars().count() > SPARSE_MIN_CODE_CHARS
        {
            debug!(
                "Trigger {}: {} annotations left, re-analyzing",
                event,
                state.annotations.len()
            );
            self.start_analysis(&mut state);
        } else {
            debug!("Trigger {}: keeping {} annotations", event, state.annotations.len());
        }
    }

    fn start_analysis(self: &Arc<Self>, state: &mut MutexGuard<'_, SessionState>) {
        let code = state.code.clone();
        if code.trim().is_empty() {
            debug!("Blank buffer, clearing annotations");
            state.annotations.clear();
            self.publish(state);
            return;
        }

        state.in_flight += 1;
        self.publish(state);

        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.run_analysis(code).await });
    }

    async fn run_analysis(&self, code: String) {
        let result = self
            .analyzer
            .analyze(&code, self.options.context.as_deref())
            .await;

        let mut state = self.state.lock().await;
        state.in_flight = state.in_flight.saturating_sub(1);

        match result {
            Ok(candidates) if !state.enabled => {
                debug!(
                    "Dropping {} candidates: annotations disabled",
                    candidates.len()
                );
            }
            Ok(_) if self.options.discard_stale_responses && state.code != code => {
                debug!("Dropping analysis of outdated buffer");
            }
            Ok(candidates) => {
                let annotations = accept_candidates(&code, candidates, self.options.max_annotations);
                info!(
                    "{} produced {} annotations",
                    self.analyzer.name(),
                    annotations.len()
                );
                state.annotations = annotations;
                state.last_analyzed_code = code;
                state.last_analyzed_at = Some(Utc::now());
            }
            Err(e) => {
                warn!("Annotation analysis failed: {}", e);
            }
        }

        self.publish(&state);
    }
}

async fn drive(inner: Weak<SessionInner>, mut events: mpsc::UnboundedReceiver<TriggerEvent>) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.on_trigger(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalysisError;
    use crate::annotations::AnnotationCandidate;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;

    type Reply = Result<Vec<AnnotationCandidate>, AnalysisError>;

    /// Analyzer that replays queued replies after an optional delay.
    #[derive(Default)]
    struct ScriptedAnalyzer {
        replies: std::sync::Mutex<VecDeque<Reply>>,
        calls: std::sync::Mutex<Vec<String>>,
        delay: Duration,
    }

    impl ScriptedAnalyzer {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Default::default()
            }
        }

        fn reply(&self, reply: Reply) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CodeAnalyzer for ScriptedAnalyzer {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn analyze(&self, code: &str, _context: Option<&str>) -> Reply {
            self.calls.lock().unwrap().push(code.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    const PATTERN: &str = "stack(s(\"bd*2 sd\"), note(\"c e g\").lpf(800))";

    fn session_with(analyzer: &Arc<ScriptedAnalyzer>, options: SessionOptions) -> AnnotationSession {
        AnnotationSession::new(analyzer.clone() as Arc<dyn CodeAnalyzer>, options)
    }

    /// Let spawned tasks run without reaching the idle timeout.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn two_candidates() -> Vec<AnnotationCandidate> {
        vec![
            AnnotationCandidate::new(6, 19, "Kick doubles up against the snare."),
            AnnotationCandidate::new(21, 36, "A major triad.").with_concept("chord-tones"),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_trigger_replaces_annotations() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(two_candidates()));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        assert!(session.is_analyzing().await);
        settle().await;

        let annotations = session.annotations().await;
        assert_eq!(annotations.len(), 2);
        assert!(annotations[0].id.as_str().starts_with("ann_"));
        assert_ne!(annotations[0].id, annotations[1].id);
        assert!(!session.is_analyzing().await);
        assert!(session.snapshot().await.last_analyzed_at.is_some());
        assert_eq!(analyzer.calls(), vec![PATTERN.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_trigger_on_blank_buffer_clears() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        let session = session_with(&analyzer, SessionOptions::default());
        let mut rx = session.subscribe();

        session.handle_code_change("   \n").await;
        session.trigger_analysis().await;
        settle().await;

        assert!(analyzer.calls().is_empty());
        assert!(session.annotations().await.is_empty());
        assert!(!session.is_analyzing().await);
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_buffer_analysis_drops_leftovers() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        let session = session_with(&analyzer, SessionOptions::default());

        // Seed a stale set directly.
        session.handle_code_change("  ").await;
        session.inner.state.lock().await.annotations =
            vec![Annotation::new(0, 2, "Leftover.", None)];

        session.trigger_analysis().await;

        assert!(session.annotations().await.is_empty());
        assert!(analyzer.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_clears_even_while_analyzing() {
        let analyzer = Arc::new(ScriptedAnalyzer::with_delay(Duration::from_millis(500)));
        analyzer.reply(Ok(two_candidates()));
        analyzer.reply(Ok(two_candidates()));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(session.annotations().await.len(), 2);

        session.trigger_analysis().await;
        assert!(session.is_analyzing().await);
        session.set_enabled(false).await;
        assert!(session.annotations().await.is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(session.annotations().await.is_empty());
        assert!(!session.is_analyzing().await);
        assert!(!session.enabled().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_stale_annotations() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(two_candidates()));
        analyzer.reply(Err(AnalysisError::Transport("connection refused".into())));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        settle().await;
        let before = session.annotations().await;

        session.trigger_analysis().await;
        settle().await;

        assert_eq!(session.annotations().await, before);
        assert!(!session.is_analyzing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_invalidate_eagerly() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(two_candidates()));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        settle().await;

        // Prepend two spaces: both annotations shift right by two.
        let shifted = format!("  {}", PATTERN);
        session.handle_code_change(&shifted).await;
        let annotations = session.annotations().await;
        assert_eq!(
            annotations.iter().map(|a| (a.from, a.to)).collect::<Vec<_>>(),
            vec![(8, 21), (23, 38)]
        );

        // Edit inside the first annotation drops it.
        let edited = shifted.replacen("bd*2", "bd*4", 1);
        session.handle_code_change(&edited).await;
        let annotations = session.annotations().await;
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].text, "A major triad.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_newline_triggers_first_analysis() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(two_candidates()));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        let with_newline = format!("{}\n", PATTERN);
        session.handle_code_change(&with_newline).await;
        settle().await;

        assert_eq!(analyzer.calls(), vec![with_newline]);
        assert_eq!(session.annotations().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_change_is_suppressed() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(two_candidates()));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        settle().await;

        let typed = format!("{}\n", PATTERN);
        session.handle_code_change(&typed).await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(analyzer.calls().len(), 1);
        assert_eq!(session.annotations().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_triggers_analysis() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        settle().await;
        assert!(analyzer.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(analyzer.calls(), vec![PATTERN.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sparse_annotations_escalate() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(vec![AnnotationCandidate::new(0, 5, "Layers play together.")]));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        settle().await;
        assert_eq!(session.annotations().await.len(), 1);

        // Similar enough to keep, but only one annotation on a long buffer.
        let longer = format!("{}.gain(0.8).room(0.3)", PATTERN);
        session.handle_code_change(&longer).await;
        tokio::time::sleep(Duration::from_millis(3100)).await;

        assert_eq!(analyzer.calls(), vec![PATTERN.to_string(), longer]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_similar_change_keeps_set_and_rebases() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(two_candidates()));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        settle().await;
        let before = session.annotations().await;

        // Twenty appended chars pass the gate but stay similar.
        let longer = format!("{}.gain(0.8).room(0.3)", PATTERN);
        session.handle_code_change(&longer).await;
        tokio::time::sleep(Duration::from_millis(3100)).await;

        assert_eq!(analyzer.calls().len(), 1);
        assert_eq!(session.annotations().await, before);
        assert_eq!(session.inner.state.lock().await.last_analyzed_code, longer);

        // Ten more chars measured from the rebased text fall under the gate.
        let longest = format!("{}.pan(0.25)", longer);
        session.handle_code_change(&longest).await;
        tokio::time::sleep(Duration::from_millis(3100)).await;

        assert_eq!(analyzer.calls().len(), 1);
        assert_eq!(session.inner.state.lock().await.last_analyzed_code, longer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sparse_set_on_short_buffer_is_kept() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(vec![AnnotationCandidate::new(0, 4, "Plays pitches.")]));
        let session = session_with(&analyzer, SessionOptions::default());

        let short = "note(\"c e g a\")";
        session.handle_code_change(short).await;
        session.trigger_analysis().await;
        settle().await;
        assert_eq!(session.annotations().await.len(), 1);

        // Exactly 30 trimmed chars with one annotation left: not sparse enough.
        let thirty = format!("{}.lpf(300).n(12)", short);
        assert_eq!(thirty.chars().count(), 30);
        session.handle_code_change(&thirty).await;
        tokio::time::sleep(Duration::from_millis(3100)).await;

        assert_eq!(analyzer.calls().len(), 1);
        assert_eq!(session.annotations().await.len(), 1);
        assert_eq!(session.inner.state.lock().await.last_analyzed_code, thirty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_session_ignores_triggers() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        let options = SessionOptions {
            enabled: false,
            ..Default::default()
        };
        let session = session_with(&analyzer, options);

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(analyzer.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_stale_responses() {
        let analyzer = Arc::new(ScriptedAnalyzer::with_delay(Duration::from_millis(500)));
        analyzer.reply(Ok(two_candidates()));
        let options = SessionOptions {
            discard_stale_responses: true,
            ..Default::default()
        };
        let session = session_with(&analyzer, options);

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        session.handle_code_change(&PATTERN.replace("800", "900")).await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(session.annotations().await.is_empty());
        assert!(session.snapshot().await.last_analyzed_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_wins_by_default() {
        let analyzer = Arc::new(ScriptedAnalyzer::with_delay(Duration::from_millis(500)));
        analyzer.reply(Ok(two_candidates()));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        session.handle_code_change(&PATTERN.replace("800", "900")).await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(session.annotations().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_annotations_resets_baseline() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(two_candidates()));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        settle().await;
        session.clear_annotations().await;
        assert!(session.annotations().await.is_empty());

        // With the baseline reset, the next newline is a big enough change.
        session.handle_code_change(&format!("{}\n", PATTERN)).await;
        settle().await;
        assert_eq!(analyzer.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_and_render_ranges() {
        let analyzer = Arc::new(ScriptedAnalyzer::default());
        analyzer.reply(Ok(vec![
            AnnotationCandidate::new(21, 36, "A major triad."),
            AnnotationCandidate::new(6, 19, "Kick doubles up."),
        ]));
        let session = session_with(&analyzer, SessionOptions::default());

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;
        settle().await;

        assert_eq!(
            session.annotation_at(19).await.map(|a| a.text),
            Some("Kick doubles up.".to_string())
        );
        assert!(session.annotation_at(20).await.is_none());

        let ranges = session.render_ranges().await;
        assert_eq!(ranges[0].from, 6);
        assert_eq!(ranges[1].from, 21);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_analysis_state() {
        let analyzer = Arc::new(ScriptedAnalyzer::with_delay(Duration::from_millis(100)));
        analyzer.reply(Ok(two_candidates()));
        let session = session_with(&analyzer, SessionOptions::default());
        let mut rx = session.subscribe();

        session.handle_code_change(PATTERN).await;
        session.trigger_analysis().await;

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_analyzing);

        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert!(!snapshot.is_analyzing);
        assert_eq!(snapshot.annotations.len(), 2);
    }
}
