use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::engine::{RenderError, Typeset, TypesetEngine};

use super::RenderRequest;

/// Messages posted back to the UI thread.
#[derive(Debug)]
pub enum WorkerEvent {
    /// The engine finished its one-shot readiness check.
    EngineReady,
    /// The engine can never become ready.
    EngineUnavailable(RenderError),
    /// A render request finished.
    Rendered {
        seq: u64,
        result: Result<Typeset, RenderError>,
    },
}

/// Runs engine calls on background threads.
///
/// Each request gets its own thread, so a slow render never blocks the
/// next one; ordering is resolved by the scheduler's sequence numbers.
pub struct RenderWorker {
    engine: Arc<dyn TypesetEngine>,
    tx: Sender<WorkerEvent>,
    rx: Receiver<WorkerEvent>,
}

impl RenderWorker {
    pub fn new(engine: Arc<dyn TypesetEngine>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { engine, tx, rx }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Start the one-shot readiness wait.
    pub fn spawn_readiness(&self) {
        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = match engine.wait_ready() {
                Ok(()) => WorkerEvent::EngineReady,
                Err(err) => WorkerEvent::EngineUnavailable(err),
            };
            let _ = tx.send(event);
        });
    }

    /// Run `request` in the background.
    pub fn submit(&self, request: RenderRequest) {
        crate::perf::log_event(
            "render.submit",
            format!("seq={} chars={}", request.seq, request.markup.chars().count()),
        );
        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = engine.typeset(&request.markup);
            let _ = tx.send(WorkerEvent::Rendered {
                seq: request.seq,
                result,
            });
        });
    }

    /// Collect everything that finished since the last call.
    pub fn drain(&self) -> Vec<WorkerEvent> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<WorkerEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl std::fmt::Debug for RenderWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderWorker")
            .field("engine", &self.engine.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::testing::ScriptedEngine;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_readiness_posts_engine_ready() {
        let worker = RenderWorker::new(Arc::new(ScriptedEngine::new(true)));
        worker.spawn_readiness();
        assert!(matches!(worker.recv_timeout(WAIT), Some(WorkerEvent::EngineReady)));
    }

    #[test]
    fn test_readiness_reports_unavailable_engine() {
        let worker = RenderWorker::new(Arc::new(ScriptedEngine::new(false)));
        worker.spawn_readiness();
        assert!(matches!(
            worker.recv_timeout(WAIT),
            Some(WorkerEvent::EngineUnavailable(RenderError::EngineUnavailable(_)))
        ));
    }

    #[test]
    fn test_submit_posts_result_with_sequence() {
        let worker = RenderWorker::new(Arc::new(ScriptedEngine::new(true)));
        worker.submit(RenderRequest {
            seq: 7,
            markup: "x^2".to_string(),
        });
        match worker.recv_timeout(WAIT) {
            Some(WorkerEvent::Rendered { seq, result }) => {
                assert_eq!(seq, 7);
                assert_eq!(result.unwrap().markup, "x^2");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_submit_reports_engine_failure() {
        let worker = RenderWorker::new(Arc::new(ScriptedEngine::new(true)));
        worker.submit(RenderRequest {
            seq: 1,
            markup: r"\bad".to_string(),
        });
        match worker.recv_timeout(WAIT) {
            Some(WorkerEvent::Rendered { result, .. }) => assert!(result.is_err()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_drain_is_empty_when_idle() {
        let worker = RenderWorker::new(Arc::new(ScriptedEngine::new(true)));
        assert!(worker.drain().is_empty());
    }
}
