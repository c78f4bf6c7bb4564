//! Task execution infrastructure.
//!
//! This module provides the fixed-size worker pool together with its task
//! representation and the reporter that receives isolated task failures.

mod panic_handler;
pub mod pool;
pub mod reporter;
pub mod task;
pub mod worker;

pub use pool::{Lifecycle, WorkerPool};
pub use reporter::{CollectingReporter, FailureReporter, TracingReporter};
pub use task::{TaskError, TaskId};
pub use worker::WorkerId;
