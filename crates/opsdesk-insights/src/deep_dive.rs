// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timed execution of deep-dive steps.
//!
//! Each deep-dive message gets at most one run. A run walks the unfinished
//! steps in order (`running`, wait for the step's duration, `complete`) and
//! then reports the analysis result. A countdown publishes the estimated time
//! remaining on a `watch` channel while the run is active.
//!
//! Runs hold only a weak reference to their sink and are cancelled through a
//! child token of the owning thread, so switching threads or dropping the
//! store stops them without further state changes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use opsdesk_core::{DeepDive, DeepDiveResult, StepStatus};

use crate::error::InsightsError;
use crate::responses::analysis_result;

/// Receives the state transitions of a run.
#[async_trait]
pub trait DeepDiveSink: Send + Sync + 'static {
    async fn step_changed(
        &self,
        message_id: &str,
        step_id: &str,
        status: StepStatus,
    ) -> Result<(), InsightsError>;

    async fn completed(
        &self,
        message_id: &str,
        result: DeepDiveResult,
    ) -> Result<(), InsightsError>;
}

struct ActiveRun {
    generation: u64,
    cancel: CancellationToken,
    remaining: watch::Receiver<Duration>,
}

/// Starts, tracks and cancels deep-dive runs, keyed by message id.
pub struct DeepDiveOrchestrator {
    runs: Arc<Mutex<HashMap<String, ActiveRun>>>,
    generation: AtomicU64,
    tick: Duration,
}

impl DeepDiveOrchestrator {
    pub fn new(tick: Duration) -> Self {
        Self {
            runs: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
            tick,
        }
    }

    /// Starts a run for `message_id` unless one is already active or the
    /// deep dive already has its result. Returns whether a run was started.
    ///
    /// Steps already complete are skipped, so a run interrupted by a thread
    /// switch resumes where it stopped.
    pub fn start<S: DeepDiveSink>(
        &self,
        sink: Weak<S>,
        message_id: &str,
        dive: &DeepDive,
        parent: &CancellationToken,
    ) -> bool {
        if dive.is_complete() {
            return false;
        }

        let cancel = parent.child_token();
        let remaining_total = secs(dive.remaining_secs());
        let (remaining_tx, remaining_rx) = watch::channel(remaining_total);

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        {
            let mut runs = self.runs.lock();
            // A cancelled run may linger until its task observes the token.
            if runs.get(message_id).is_some_and(|r| !r.cancel.is_cancelled()) {
                debug!(message_id, "deep dive already running");
                return false;
            }
            runs.insert(
                message_id.to_string(),
                ActiveRun {
                    generation,
                    cancel: cancel.clone(),
                    remaining: remaining_rx,
                },
            );
        }

        let steps: Vec<(String, Duration)> = dive
            .steps
            .iter()
            .filter(|s| s.status != StepStatus::Complete)
            .map(|s| (s.id.clone(), secs(s.duration_secs)))
            .collect();
        let result = analysis_result(dive.analysis);
        let message_id = message_id.to_string();
        let runs = Arc::clone(&self.runs);
        let tick = self.tick;

        info!(
            message_id = %message_id,
            steps = steps.len(),
            analysis = %dive.analysis,
            "deep dive started"
        );

        tokio::spawn(countdown(remaining_tx, remaining_total, tick, cancel.clone()));
        tokio::spawn(async move {
            let outcome = run(&sink, &message_id, steps, result, &cancel).await;
            // Stop the countdown whatever happened.
            cancel.cancel();
            {
                let mut runs = runs.lock();
                if runs.get(&message_id).is_some_and(|r| r.generation == generation) {
                    runs.remove(&message_id);
                }
            }
            match outcome {
                Ok(true) => info!(message_id = %message_id, "deep dive complete"),
                Ok(false) => debug!(message_id = %message_id, "deep dive cancelled"),
                Err(e) => warn!(message_id = %message_id, error = %e, "deep dive aborted"),
            }
        });
        true
    }

    pub fn is_running(&self, message_id: &str) -> bool {
        self.runs
            .lock()
            .get(message_id)
            .is_some_and(|r| !r.cancel.is_cancelled())
    }

    pub fn running_count(&self) -> usize {
        self.runs
            .lock()
            .values()
            .filter(|r| !r.cancel.is_cancelled())
            .count()
    }

    /// The time-remaining channel of an active run.
    pub fn remaining(&self, message_id: &str) -> Option<watch::Receiver<Duration>> {
        self.runs.lock().get(message_id).map(|r| r.remaining.clone())
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

/// Returns `Ok(true)` when the run finished, `Ok(false)` when cancelled or
/// the sink went away.
async fn run<S: DeepDiveSink>(
    sink: &Weak<S>,
    message_id: &str,
    steps: Vec<(String, Duration)>,
    result: DeepDiveResult,
    cancel: &CancellationToken,
) -> Result<bool, InsightsError> {
    for (step_id, duration) in steps {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        let Some(target) = sink.upgrade() else {
            return Ok(false);
        };
        target
            .step_changed(message_id, &step_id, StepStatus::Running)
            .await?;
        drop(target);

        tokio::select! {
            _ = cancel.cancelled() => return Ok(false),
            _ = tokio::time::sleep(duration) => {}
        }

        let Some(target) = sink.upgrade() else {
            return Ok(false);
        };
        target
            .step_changed(message_id, &step_id, StepStatus::Complete)
            .await?;
    }

    if cancel.is_cancelled() {
        return Ok(false);
    }
    let Some(target) = sink.upgrade() else {
        return Ok(false);
    };
    target.completed(message_id, result).await?;
    Ok(true)
}

async fn countdown(
    tx: watch::Sender<Duration>,
    total: Duration,
    tick: Duration,
    cancel: CancellationToken,
) {
    let mut remaining = total;
    while !remaining.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(tick) => {}
        }
        remaining = remaining.saturating_sub(tick);
        if tx.send(remaining).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::{AnalysisKind, DeepDiveStep};

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<(String, StepStatus)>>,
        results: Mutex<Vec<DeepDiveResult>>,
    }

    #[async_trait]
    impl DeepDiveSink for RecordingSink {
        async fn step_changed(
            &self,
            _message_id: &str,
            step_id: &str,
            status: StepStatus,
        ) -> Result<(), InsightsError> {
            self.events.lock().push((step_id.to_string(), status));
            Ok(())
        }

        async fn completed(
            &self,
            _message_id: &str,
            result: DeepDiveResult,
        ) -> Result<(), InsightsError> {
            self.results.lock().push(result);
            Ok(())
        }
    }

    fn dive() -> DeepDive {
        DeepDive::new(
            AnalysisKind::Sentiment,
            vec![
                DeepDiveStep::pending("a", "First", 1.0),
                DeepDiveStep::pending("b", "Second", 2.0),
            ],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn steps_run_in_order_then_complete() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = DeepDiveOrchestrator::new(Duration::from_millis(100));
        let root = CancellationToken::new();

        assert!(orchestrator.start(Arc::downgrade(&sink), "m1", &dive(), &root));
        assert!(orchestrator.is_running("m1"));

        tokio::time::sleep(Duration::from_millis(3100)).await;

        let events = sink.events.lock().clone();
        assert_eq!(
            events,
            vec![
                ("a".to_string(), StepStatus::Running),
                ("a".to_string(), StepStatus::Complete),
                ("b".to_string(), StepStatus::Running),
                ("b".to_string(), StepStatus::Complete),
            ]
        );
        assert_eq!(sink.results.lock().len(), 1);
        assert!(!orchestrator.is_running("m1"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_for_same_message_is_rejected() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = DeepDiveOrchestrator::new(Duration::from_millis(100));
        let root = CancellationToken::new();

        assert!(orchestrator.start(Arc::downgrade(&sink), "m1", &dive(), &root));
        assert!(!orchestrator.start(Arc::downgrade(&sink), "m1", &dive(), &root));
        assert_eq!(orchestrator.running_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_dive_is_not_restarted() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = DeepDiveOrchestrator::new(Duration::from_millis(100));
        let mut done = dive();
        done.result = Some(analysis_result(AnalysisKind::Sentiment));

        assert!(!orchestrator.start(Arc::downgrade(&sink), "m1", &done, &CancellationToken::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_without_further_events() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = DeepDiveOrchestrator::new(Duration::from_millis(100));
        let thread = CancellationToken::new();

        orchestrator.start(Arc::downgrade(&sink), "m1", &dive(), &thread);
        tokio::time::sleep(Duration::from_millis(500)).await;
        thread.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(
            sink.events.lock().clone(),
            vec![("a".to_string(), StepStatus::Running)]
        );
        assert!(sink.results.lock().is_empty());
        assert!(!orchestrator.is_running("m1"));
    }

    #[tokio::test(start_paused = true)]
    async fn resume_skips_completed_steps() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = DeepDiveOrchestrator::new(Duration::from_millis(100));
        let mut partial = dive();
        partial.steps[0].status = StepStatus::Complete;
        partial.steps[1].status = StepStatus::Running;

        orchestrator.start(Arc::downgrade(&sink), "m1", &partial, &CancellationToken::new());
        tokio::time::sleep(Duration::from_millis(2100)).await;

        assert_eq!(
            sink.events.lock().clone(),
            vec![
                ("b".to_string(), StepStatus::Running),
                ("b".to_string(), StepStatus::Complete),
            ]
        );
        assert_eq!(sink.results.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_down() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = DeepDiveOrchestrator::new(Duration::from_millis(100));
        orchestrator.start(Arc::downgrade(&sink), "m1", &dive(), &CancellationToken::new());

        let remaining = orchestrator.remaining("m1").unwrap();
        assert_eq!(*remaining.borrow(), Duration::from_secs(3));

        tokio::time::sleep(Duration::from_millis(1050)).await;
        let now = *remaining.borrow();
        assert!(now <= Duration::from_millis(2000), "remaining was {now:?}");
        assert!(now >= Duration::from_millis(1900), "remaining was {now:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sink_ends_the_run() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = DeepDiveOrchestrator::new(Duration::from_millis(100));
        orchestrator.start(Arc::downgrade(&sink), "m1", &dive(), &CancellationToken::new());
        drop(sink);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!orchestrator.is_running("m1"));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_cancel_replaces_stale_run() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = DeepDiveOrchestrator::new(Duration::from_millis(100));
        let first = CancellationToken::new();

        orchestrator.start(Arc::downgrade(&sink), "m1", &dive(), &first);
        first.cancel();
        let second = CancellationToken::new();
        assert!(orchestrator.start(Arc::downgrade(&sink), "m1", &dive(), &second));

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(sink.results.lock().len(), 1);
        assert!(!orchestrator.is_running("m1"));
    }
}
