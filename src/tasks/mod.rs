//! Periodic background tasks
//!
//! Each task implements [`PeriodicTask`]; [`run_periodic`] drives it until the
//! cancellation token fires.
//!
//! # Design
//!
//! - One cycle runs immediately, then the driver sleeps `interval` after a
//!   successful cycle and `backoff` after a failed one
//! - Every cycle runs in its own tokio task, so a panic surfaces as
//!   [`TaskError::Panicked`] instead of ending the loop
//! - Cancellation is observed while sleeping; a running cycle completes first
//! - Tests call `run_cycle` directly to drive single cycles

pub mod broadcast;
pub mod health;
pub mod metrics;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use health::HealthMonitor;
pub use metrics::MetricsCollector;

use crate::config::TaskSchedule;
use crate::error::TaskError;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A unit of work repeated on a fixed schedule
#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    /// Task name (for logging)
    fn name(&self) -> &'static str;

    fn schedule(&self) -> TaskSchedule;

    /// Run one cycle
    async fn run_cycle(&self) -> Result<(), TaskError>;
}

/// Counters returned when a periodic task stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub failures: u64,
}

/// Drive `task` until `cancel` fires
pub async fn run_periodic(task: Arc<dyn PeriodicTask>, cancel: CancellationToken) -> RunSummary {
    let name = task.name();
    let schedule = task.schedule();
    let mut summary = RunSummary::default();

    info!(
        task = name,
        interval_secs = schedule.interval.as_secs(),
        backoff_secs = schedule.backoff.as_secs(),
        "Starting periodic task"
    );

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let delay = match run_guarded(task.clone()).await {
            Ok(()) => schedule.interval,
            Err(e) => {
                summary.failures += 1;
                error!(task = name, kind = e.kind(), "Error in {}: {}", name, e);
                schedule.backoff
            }
        };
        summary.cycles += 1;

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(task = name, "Periodic task received shutdown signal");
                break;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!(
        task = name,
        cycles = summary.cycles,
        failures = summary.failures,
        "Periodic task stopped"
    );
    summary
}

/// Per-cycle error boundary
async fn run_guarded(task: Arc<dyn PeriodicTask>) -> Result<(), TaskError> {
    let name = task.name();
    match tokio::spawn(async move { task.run_cycle().await }).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(TaskError::Panicked {
            task: name,
            message: panic_message(e.into_panic()),
        }),
        Err(e) => Err(TaskError::Cycle {
            task: name,
            message: e.to_string(),
        }),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    /// Task that reports each cycle start and misbehaves on chosen cycles
    struct ScriptedTask {
        cycle: AtomicU64,
        fail_on: Option<u64>,
        panic_on: Option<u64>,
        started: mpsc::UnboundedSender<Instant>,
    }

    impl ScriptedTask {
        fn new(
            fail_on: Option<u64>,
            panic_on: Option<u64>,
        ) -> (Arc<Self>, mpsc::UnboundedReceiver<Instant>) {
            let (started, rx) = mpsc::unbounded_channel();
            let task = Arc::new(Self {
                cycle: AtomicU64::new(0),
                fail_on,
                panic_on,
                started,
            });
            (task, rx)
        }
    }

    #[async_trait]
    impl PeriodicTask for ScriptedTask {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn schedule(&self) -> TaskSchedule {
            TaskSchedule::new(Duration::from_secs(30), Duration::from_secs(5))
        }

        async fn run_cycle(&self) -> Result<(), TaskError> {
            let n = self.cycle.fetch_add(1, Ordering::SeqCst);
            let _ = self.started.send(Instant::now());
            if self.panic_on == Some(n) {
                panic!("scripted panic");
            }
            if self.fail_on == Some(n) {
                return Err(TaskError::Cycle {
                    task: "scripted",
                    message: "scripted failure".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_uses_backoff() {
        let (task, mut started) = ScriptedTask::new(Some(0), None);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_periodic(task, cancel.clone()));

        let t0 = started.recv().await.unwrap();
        let t1 = started.recv().await.unwrap();
        let t2 = started.recv().await.unwrap();
        cancel.cancel();
        let summary = handle.await.unwrap();

        assert_eq!(t1 - t0, Duration::from_secs(5));
        assert_eq!(t2 - t1, Duration::from_secs(30));
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.cycles, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_does_not_end_task() {
        let (task, mut started) = ScriptedTask::new(None, Some(0));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_periodic(task.clone(), cancel.clone()));

        started.recv().await.unwrap();
        started.recv().await.unwrap();
        cancel.cancel();
        let summary = handle.await.unwrap();

        assert_eq!(summary.failures, 1);
        assert!(task.cycle.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep() {
        let (task, mut started) = ScriptedTask::new(None, None);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_periodic(task, cancel.clone()));

        started.recv().await.unwrap();
        cancel.cancel();

        // Far shorter than the 30s interval the task is sleeping through
        let summary = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task did not stop during sleep")
            .unwrap();
        assert_eq!(summary.cycles, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (task, _started) = ScriptedTask::new(None, None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = run_periodic(task, cancel).await;
        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new("owned".to_string())), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "non-string panic payload");
    }
}
