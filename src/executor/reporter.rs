//! Destination for isolated task failures.

use super::task::{TaskError, TaskId};
use parking_lot::Mutex;

/// Receives every task failure a pool absorbs.
///
/// Called from worker threads, possibly concurrently.
pub trait FailureReporter: Send + Sync {
    fn report(&self, task: TaskId, error: &TaskError);
}

impl<F> FailureReporter for F
where
    F: Fn(TaskId, &TaskError) + Send + Sync,
{
    fn report(&self, task: TaskId, error: &TaskError) {
        self(task, error)
    }
}

/// Default reporter: one `tracing` warning per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, task: TaskId, error: &TaskError) {
        tracing::warn!(task = %task, error = %error, "task failed");
    }
}

/// Keeps every reported failure in memory, in report order.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    failures: Mutex<Vec<(TaskId, TaskError)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<(TaskId, TaskError)> {
        self.failures.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.failures.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FailureReporter for CollectingReporter {
    fn report(&self, task: TaskId, error: &TaskError) {
        self.failures.lock().push((task, error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::task::Task;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingReporter::new();
        assert!(reporter.is_empty());

        let task = Task::new(|| Err("nope"));
        let id = task.id;
        let err = task.run().unwrap_err();
        reporter.report(id, &err);

        assert_eq!(reporter.failures(), vec![(id, TaskError::Failed("nope".into()))]);
    }

    #[test]
    fn test_closure_reporter() {
        let calls = AtomicUsize::new(0);
        let reporter = |_: TaskId, _: &TaskError| {
            calls.fetch_add(1, Ordering::SeqCst);
        };

        let task = Task::new(|| Err("nope"));
        reporter.report(task.id, &TaskError::Failed("nope".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
