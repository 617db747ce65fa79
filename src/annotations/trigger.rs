//! Trigger policy: decides when a buffer change warrants fresh analysis.
//!
//! Analysis is considered when:
//! 1. A newline is typed
//! 2. A closing paren `)` is followed by a space, newline or `.`
//! 3. The buffer has been idle for the configured timeout (fallback)
//!
//! and, for everything except manual triggers, at least the configured number
//! of characters changed since the last analysis.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Default minimum change in buffer length before a non-manual trigger acts.
pub const DEFAULT_MIN_CHANGE_THRESHOLD: usize = 15;

/// Default idle timeout before an `idle` trigger fires.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Classified reason to consider refreshing annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerEvent {
    Newline,
    ParenClose,
    Idle,
    Manual,
}

impl TriggerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerEvent::Newline => "newline",
            TriggerEvent::ParenClose => "paren-close",
            TriggerEvent::Idle => "idle",
            TriggerEvent::Manual => "manual",
        }
    }
}

impl std::fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning for the trigger policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerOptions {
    /// Minimum characters changed since the last analysis.
    pub min_change_threshold: usize,
    /// Idle time after the last change before an `idle` trigger.
    pub idle_timeout: Duration,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            min_change_threshold: DEFAULT_MIN_CHANGE_THRESHOLD,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Gate a trigger event against the change since the last analysis.
pub fn should_trigger_analysis(
    current_code: &str,
    last_analyzed_code: &str,
    event: TriggerEvent,
    options: &TriggerOptions,
) -> bool {
    if event == TriggerEvent::Manual {
        return !current_code.trim().is_empty();
    }

    let current_len = current_code.chars().count();
    let last_len = last_analyzed_code.chars().count();
    if current_len.abs_diff(last_len) < options.min_change_threshold {
        return false;
    }

    !current_code.trim().is_empty()
}

/// Detect a structural trigger event between two consecutive snapshots.
pub fn detect_trigger_event(previous_code: &str, current_code: &str) -> Option<TriggerEvent> {
    if previous_code == current_code {
        return None;
    }

    let previous_len = previous_code.chars().count();
    let current_len = current_code.chars().count();
    if current_len != previous_len + 1 {
        return None;
    }

    if current_code.ends_with('\n') && !previous_code.ends_with('\n') {
        return Some(TriggerEvent::Newline);
    }

    let mut tail = current_code.chars().rev();
    match (tail.next(), tail.next()) {
        (Some(' ' | '\n' | '.'), Some(')')) => Some(TriggerEvent::ParenClose),
        _ => None,
    }
}

/// Stateful debouncer that turns buffer snapshots into trigger events.
///
/// Events are delivered on the channel passed at construction. At most one
/// idle timer is outstanding; every change that is not itself a structural
/// event cancels it and arms a new one. Arming a timer spawns a Tokio task, so
/// `handle_change` must run inside a Tokio runtime.
pub struct TriggerHandler {
    options: TriggerOptions,
    previous_code: String,
    events: mpsc::UnboundedSender<TriggerEvent>,
    idle_generation: Arc<AtomicU64>,
    idle_task: Option<JoinHandle<()>>,
}

impl TriggerHandler {
    /// Create a handler that sends events to `events`.
    pub fn new(options: TriggerOptions, events: mpsc::UnboundedSender<TriggerEvent>) -> Self {
        Self {
            options,
            previous_code: String::new(),
            events,
            idle_generation: Arc::new(AtomicU64::new(0)),
            idle_task: None,
        }
    }

    /// Create a handler together with the receiving end of its event channel.
    pub fn channel(options: TriggerOptions) -> (Self, mpsc::UnboundedReceiver<TriggerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(options, tx), rx)
    }

    pub fn options(&self) -> &TriggerOptions {
        &self.options
    }

    /// Last snapshot seen.
    pub fn previous_code(&self) -> &str {
        &self.previous_code
    }

    /// Whether an idle timer is armed and has not fired yet.
    pub fn has_pending_idle(&self) -> bool {
        self.idle_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Handle a new buffer snapshot. Returns the structural event, if any,
    /// after sending it.
    pub fn handle_change(&mut self, code: &str) -> Option<TriggerEvent> {
        let event = detect_trigger_event(&self.previous_code, code);
        self.previous_code.clear();
        self.previous_code.push_str(code);

        match event {
            Some(event) => {
                self.cancel_idle();
                trace!("Structural trigger: {}", event);
                let _ = self.events.send(event);
            }
            None => self.arm_idle(),
        }
        event
    }

    /// Cancel the pending idle timer, if any.
    pub fn cancel_idle(&mut self) {
        // Bumping the generation makes a timer that already woke up a no-op.
        self.idle_generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.idle_task.take() {
            task.abort();
        }
    }

    fn arm_idle(&mut self) {
        self.cancel_idle();

        let generation = self.idle_generation.load(Ordering::SeqCst);
        let current = Arc::clone(&self.idle_generation);
        let events = self.events.clone();
        let timeout = self.options.idle_timeout;

        self.idle_task = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if current.load(Ordering::SeqCst) == generation {
                let _ = events.send(TriggerEvent::Idle);
            }
        }));
    }
}

impl Drop for TriggerHandler {
    fn drop(&mut self) {
        self.cancel_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::Instant;

    #[test]
    fn test_detect_newline() {
        assert_eq!(
            detect_trigger_event("s(\"bd\")", "s(\"bd\")\n"),
            Some(TriggerEvent::Newline)
        );
        // Two characters at once is a paste, not a typed newline.
        assert_eq!(detect_trigger_event("s(\"bd\")", "s(\"bd\")\n\n"), None);
        // Previous already ended with a newline.
        assert_eq!(detect_trigger_event("a\n", "a\n\n"), None);
    }

    #[test]
    fn test_detect_paren_close() {
        assert_eq!(
            detect_trigger_event("s(\"bd\")", "s(\"bd\")."),
            Some(TriggerEvent::ParenClose)
        );
        assert_eq!(
            detect_trigger_event("s(\"bd\")", "s(\"bd\") "),
            Some(TriggerEvent::ParenClose)
        );
        assert_eq!(detect_trigger_event("s(\"bd\"", "s(\"bd\")"), None);
        assert_eq!(detect_trigger_event("s(\"bd\")", "s(\"bd\")x"), None);
    }

    #[test]
    fn test_detect_ignores_deletions_and_no_change() {
        assert_eq!(detect_trigger_event("abc", "abc"), None);
        assert_eq!(detect_trigger_event("abc)\n", "abc)"), None);
    }

    #[test]
    fn test_threshold_suppresses_small_changes() {
        let options = TriggerOptions::default();
        let last = "s(\"bd sd\")";
        let current = format!("{}{}", last, "0123456789");

        for event in [TriggerEvent::Newline, TriggerEvent::ParenClose, TriggerEvent::Idle] {
            assert!(!should_trigger_analysis(&current, last, event, &options));
        }

        let bigger = format!("{}{}", last, "0123456789abcde");
        assert!(should_trigger_analysis(&bigger, last, TriggerEvent::Idle, &options));
    }

    #[test]
    fn test_threshold_counts_shrinking_buffers() {
        let options = TriggerOptions::default();
        let last = "x".repeat(40);
        let current = "x".repeat(20);
        assert!(should_trigger_analysis(&current, &last, TriggerEvent::Newline, &options));
    }

    #[test]
    fn test_manual_bypasses_threshold() {
        let options = TriggerOptions::default();
        assert!(should_trigger_analysis("s(\"bd\")", "s(\"bd\")", TriggerEvent::Manual, &options));
        assert!(!should_trigger_analysis("  \n ", "", TriggerEvent::Manual, &options));
    }

    #[test]
    fn test_blank_buffer_never_triggers() {
        let options = TriggerOptions::default();
        let blank = " ".repeat(30);
        assert!(!should_trigger_analysis(&blank, "", TriggerEvent::Idle, &options));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_fires_after_timeout() {
        let (mut handler, mut rx) = TriggerHandler::channel(TriggerOptions::default());
        let start = Instant::now();

        assert_eq!(handler.handle_change("s(\"bd"), None);
        assert!(handler.has_pending_idle());

        assert_eq!(rx.recv().await, Some(TriggerEvent::Idle));
        assert!(start.elapsed() >= DEFAULT_IDLE_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_rearms_on_each_change() {
        let (mut handler, mut rx) = TriggerHandler::channel(TriggerOptions::default());

        handler.handle_change("s");
        tokio::time::sleep(Duration::from_millis(2000)).await;
        handler.handle_change("s(");
        let rearmed_at = Instant::now();

        assert_eq!(rx.recv().await, Some(TriggerEvent::Idle));
        assert!(rearmed_at.elapsed() >= DEFAULT_IDLE_TIMEOUT);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_structural_event_cancels_idle() {
        let (mut handler, mut rx) = TriggerHandler::channel(TriggerOptions::default());

        handler.handle_change("s(\"bd\")");
        assert!(handler.has_pending_idle());
        assert_eq!(
            handler.handle_change("s(\"bd\")\n"),
            Some(TriggerEvent::Newline)
        );
        assert!(!handler.has_pending_idle());

        assert_eq!(rx.recv().await, Some(TriggerEvent::Newline));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_idle_timer() {
        let (mut handler, mut rx) = TriggerHandler::channel(TriggerOptions::default());
        handler.handle_change("s(");
        drop(handler);

        assert_eq!(rx.recv().await, None);
    }
}
