//! Task representation and execution.

use super::panic_handler;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Failure of a single task body. Never propagated to the submitter; it is
/// handed to the pool's [`FailureReporter`](super::FailureReporter).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    pub fn message(&self) -> &str {
        match self {
            TaskError::Failed(msg) | TaskError::Panicked(msg) => msg,
        }
    }
}

type TaskBody = Box<dyn FnOnce() -> Result<(), TaskError> + Send + 'static>;

/// Internal task representation
pub(crate) struct Task {
    pub(crate) id: TaskId,
    func: TaskBody,
    submit_time: Instant,
}

impl Task {
    pub fn new<F, E>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        Task {
            id: TaskId::next(),
            func: Box::new(move || f().map_err(|e| TaskError::Failed(e.to_string()))),
            submit_time: Instant::now(),
        }
    }

    pub fn queued_for(&self) -> Duration {
        self.submit_time.elapsed()
    }

    /// Run the body, turning a panic into [`TaskError::Panicked`]
    pub fn run(self) -> Result<(), TaskError> {
        panic_handler::isolate(self.func)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("submit_time", &self.submit_time)
            .finish()
    }
}
