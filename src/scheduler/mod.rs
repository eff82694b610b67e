//! Render scheduling.
//!
//! [`RenderScheduler`] is a pure state machine: it is told about text
//! changes, engine readiness and render completions, and answers with
//! [`RenderRequest`]s. Time is passed in, so the debounce behavior can be
//! tested without sleeping. [`RenderWorker`] executes requests off the UI
//! thread.

mod worker;

pub use worker::{RenderWorker, WorkerEvent};

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::{RenderError, Typeset};

/// Default quiet period before a render is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Shown in the preview when the engine rejects the markup.
pub const RENDER_ERROR_MESSAGE: &str = "Error rendering formula. Check the LaTeX syntax.";

/// Shown in the preview when there is nothing to render.
pub const PLACEHOLDER_MESSAGE: &str = "Type a formula to see the preview";

/// Shown while the engine has not reported ready.
pub const LOADING_MESSAGE: &str = "Loading typesetting engine...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    EngineLoading,
    Idle,
    Rendering,
    Error,
}

/// What the preview pane currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Loading,
    Placeholder,
    Output(Arc<Typeset>),
    Error(String),
}

impl Preview {
    /// The rendered output, if the last applied render succeeded.
    pub fn output(&self) -> Option<&Typeset> {
        match self {
            Self::Output(ts) => Some(ts),
            _ => None,
        }
    }
}

/// A render the worker should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub seq: u64,
    pub markup: String,
}

/// Debounced, sequence-guarded render scheduling.
#[derive(Debug)]
pub struct RenderScheduler {
    debounce: Duration,
    engine_ready: bool,
    deadline: Option<Instant>,
    /// Last issued sequence number (0 = none yet).
    latest_seq: u64,
    /// Completions with a sequence number at or below this are ignored.
    discard_through: u64,
    state: RenderState,
    preview: Preview,
    /// Last sequence whose result was applied to the preview.
    applied_seq: u64,
}

impl RenderScheduler {
    pub const fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            engine_ready: false,
            deadline: None,
            latest_seq: 0,
            discard_through: 0,
            state: RenderState::EngineLoading,
            preview: Preview::Loading,
            applied_seq: 0,
        }
    }

    pub const fn state(&self) -> RenderState {
        self.state
    }

    pub const fn preview(&self) -> &Preview {
        &self.preview
    }

    pub const fn is_engine_ready(&self) -> bool {
        self.engine_ready
    }

    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    /// When the pending debounce timer fires, if one is running.
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub const fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    /// The engine became available: leave `EngineLoading` and render now.
    pub fn engine_ready(&mut self, text: &str) -> Option<RenderRequest> {
        if self.engine_ready {
            return None;
        }
        self.engine_ready = true;
        self.deadline = None;
        self.state = RenderState::Idle;
        if text.trim().is_empty() {
            self.preview = Preview::Placeholder;
            return None;
        }
        Some(self.issue(text))
    }

    /// Document text changed at `now`.
    ///
    /// Blank text shows the placeholder at once and leaves any pending
    /// timer alone; otherwise the trailing-edge timer is restarted.
    pub fn text_changed(&mut self, text: &str, now: Instant) {
        if text.trim().is_empty() {
            self.discard_through = self.latest_seq;
            if self.engine_ready {
                self.state = RenderState::Idle;
                self.preview = Preview::Placeholder;
            }
            return;
        }
        if !self.engine_ready {
            // Rendered by engine_ready() once the engine shows up.
            return;
        }
        self.deadline = Some(now + self.debounce);
    }

    /// Fire the debounce timer if it has expired.
    ///
    /// `text` is the current document; the request always carries the text
    /// as of the last change, never an older snapshot.
    pub fn poll(&mut self, text: &str, now: Instant) -> Option<RenderRequest> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        if !self.engine_ready || text.trim().is_empty() {
            return None;
        }
        Some(self.issue(text))
    }

    /// Apply a finished render.
    ///
    /// Returns `true` if the result changed the preview. Results from any
    /// request older than the most recently issued one are dropped.
    pub fn complete(&mut self, seq: u64, result: Result<Typeset, RenderError>) -> bool {
        if seq != self.latest_seq || seq <= self.discard_through {
            tracing::debug!(seq, latest = self.latest_seq, "dropping stale render result");
            return false;
        }
        self.applied_seq = seq;
        match result {
            Ok(typeset) => {
                self.state = RenderState::Idle;
                self.preview = Preview::Output(Arc::new(typeset));
            }
            Err(err) => {
                tracing::debug!(seq, %err, "render failed");
                self.state = RenderState::Error;
                self.preview = Preview::Error(RENDER_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    fn issue(&mut self, text: &str) -> RenderRequest {
        self.latest_seq += 1;
        self.state = RenderState::Rendering;
        RenderRequest {
            seq: self.latest_seq,
            markup: text.to_string(),
        }
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const QUADRATIC: &str = r"x = \frac{-b \pm \sqrt{b^2 - 4ac}}{2a}";

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn ok(markup: &str) -> Result<Typeset, RenderError> {
        Ok(Typeset {
            markup: markup.to_string(),
            svg: "<svg/>".to_string(),
        })
    }

    fn failed() -> Result<Typeset, RenderError> {
        Err(RenderError::Failed {
            status: "exit status: 1".to_string(),
            stderr: "Missing }".to_string(),
        })
    }

    fn ready_scheduler(text: &str) -> RenderScheduler {
        let mut s = RenderScheduler::new(ms(500));
        if let Some(req) = s.engine_ready(text) {
            s.complete(req.seq, ok(&req.markup));
        }
        s
    }

    #[test]
    fn test_starts_loading() {
        let s = RenderScheduler::default();
        assert_eq!(s.state(), RenderState::EngineLoading);
        assert_eq!(s.preview(), &Preview::Loading);
        assert!(!s.is_engine_ready());
    }

    #[test]
    fn test_engine_ready_renders_initial_text_once() {
        let mut s = RenderScheduler::new(ms(500));
        let req = s.engine_ready(QUADRATIC).expect("initial render");
        assert_eq!(req.markup, QUADRATIC);
        assert_eq!(s.state(), RenderState::Rendering);
        assert!(s.engine_ready(QUADRATIC).is_none());
        assert!(s.poll(QUADRATIC, Instant::now() + ms(10_000)).is_none());
    }

    #[test]
    fn test_engine_ready_with_blank_text_shows_placeholder() {
        let mut s = RenderScheduler::new(ms(500));
        assert!(s.engine_ready("   ").is_none());
        assert_eq!(s.state(), RenderState::Idle);
        assert_eq!(s.preview(), &Preview::Placeholder);
    }

    #[test]
    fn test_changes_while_loading_do_not_start_timer() {
        let mut s = RenderScheduler::new(ms(500));
        let t0 = Instant::now();
        s.text_changed("x^2", t0);
        assert!(s.next_deadline().is_none());
        assert!(s.poll("x^2", t0 + ms(600)).is_none());
        assert_eq!(s.engine_ready("x^2").map(|r| r.markup), Some("x^2".to_string()));
    }

    #[test]
    fn test_debounce_waits_for_quiet_period() {
        let mut s = ready_scheduler("a");
        let t0 = Instant::now();
        s.text_changed("ab", t0);
        assert!(s.poll("ab", t0 + ms(499)).is_none());
        let req = s.poll("ab", t0 + ms(500)).expect("fires after quiet period");
        assert_eq!(req.markup, "ab");
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn test_each_change_restarts_timer() {
        let mut s = ready_scheduler("a");
        let t0 = Instant::now();
        s.text_changed("ab", t0);
        s.text_changed("abc", t0 + ms(400));
        assert!(s.poll("abc", t0 + ms(600)).is_none());
        let req = s.poll("abc", t0 + ms(900)).unwrap();
        assert_eq!(req.markup, "abc");
    }

    #[test]
    fn test_blank_text_shows_placeholder_without_touching_timer() {
        let mut s = ready_scheduler("a");
        let t0 = Instant::now();
        s.text_changed("ab", t0);
        let deadline = s.next_deadline();
        s.text_changed("  ", t0 + ms(100));
        assert_eq!(s.preview(), &Preview::Placeholder);
        assert_eq!(s.next_deadline(), deadline);
        // Timer still fires but there is nothing to render.
        assert!(s.poll("  ", t0 + ms(600)).is_none());
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn test_failure_then_recovery() {
        let mut s = ready_scheduler(QUADRATIC);
        let t0 = Instant::now();

        s.text_changed(r"\frac{a}{b", t0);
        let bad = s.poll(r"\frac{a}{b", t0 + ms(500)).unwrap();
        assert!(s.complete(bad.seq, failed()));
        assert_eq!(s.state(), RenderState::Error);
        assert_eq!(s.preview(), &Preview::Error(RENDER_ERROR_MESSAGE.to_string()));

        let t1 = t0 + ms(1_000);
        s.text_changed(QUADRATIC, t1);
        let good = s.poll(QUADRATIC, t1 + ms(500)).unwrap();
        assert!(s.complete(good.seq, ok(QUADRATIC)));
        assert_eq!(s.state(), RenderState::Idle);
        assert_eq!(s.preview().output().map(|t| t.markup.as_str()), Some(QUADRATIC));
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut s = ready_scheduler("a");
        let t0 = Instant::now();
        s.text_changed("slow", t0);
        let first = s.poll("slow", t0 + ms(500)).unwrap();
        s.text_changed("fast", t0 + ms(600));
        let second = s.poll("fast", t0 + ms(1_100)).unwrap();

        assert!(s.complete(second.seq, ok("fast")));
        assert!(!s.complete(first.seq, ok("slow")));
        assert_eq!(s.preview().output().map(|t| t.markup.as_str()), Some("fast"));
        assert_eq!(s.applied_seq(), second.seq);
    }

    #[test]
    fn test_older_result_is_dropped_even_if_it_arrives_first() {
        let mut s = ready_scheduler("a");
        let t0 = Instant::now();
        s.text_changed("one", t0);
        let first = s.poll("one", t0 + ms(500)).unwrap();
        s.text_changed("two", t0 + ms(600));
        let second = s.poll("two", t0 + ms(1_100)).unwrap();

        assert!(!s.complete(first.seq, ok("one")));
        assert_eq!(s.state(), RenderState::Rendering);
        assert!(s.complete(second.seq, ok("two")));
        assert_eq!(s.state(), RenderState::Idle);
    }

    #[test]
    fn test_clearing_text_discards_in_flight_render() {
        let mut s = ready_scheduler("a");
        let t0 = Instant::now();
        s.text_changed("abc", t0);
        let req = s.poll("abc", t0 + ms(500)).unwrap();
        s.text_changed("", t0 + ms(550));
        assert!(!s.complete(req.seq, ok("abc")));
        assert_eq!(s.preview(), &Preview::Placeholder);
    }

    proptest! {
        #[test]
        fn prop_burst_of_changes_issues_one_render(
            gaps in proptest::collection::vec(0u64..499, 1..20),
        ) {
            let mut s = ready_scheduler("seed");
            let t0 = Instant::now();
            let mut now = t0;
            let mut requests = Vec::new();
            let mut last_text = String::new();
            for (i, gap) in gaps.iter().enumerate() {
                now += ms(*gap);
                last_text = format!("x_{i}");
                s.text_changed(&last_text, now);
                if let Some(req) = s.poll(&last_text, now) {
                    requests.push(req);
                }
            }
            if let Some(req) = s.poll(&last_text, now + ms(500)) {
                requests.push(req);
            }
            prop_assert_eq!(requests.len(), 1);
            prop_assert_eq!(&requests[0].markup, &last_text);
        }
    }
}
