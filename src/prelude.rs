pub use crate::cancel::CancelToken;
pub use crate::config::{PoolConfig, PoolConfigBuilder};
pub use crate::counter::{Mode, SharedCounter};
pub use crate::error::{Error, Result, TrySendError};
pub use crate::executor::{
    CollectingReporter, FailureReporter, Lifecycle, TaskError, TaskId, TracingReporter,
    WorkerPool,
};
pub use crate::handoff::HandoffChannel;
pub use crate::telemetry::MetricsSnapshot;
pub use crate::trial::{CounterTrial, TrialOutcome, TrialSummary};
