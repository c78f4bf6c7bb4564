//! veda-sync - concurrency primitives toolkit
//!
//! Three building blocks for sharing work and state between threads:
//!
//! - [`SharedCounter`]: an integer counter with an unsynchronized and an
//!   exclusive (mutex-guarded) access discipline. The unsynchronized mode
//!   loses updates under contention on purpose, which makes races observable.
//! - [`HandoffChannel`]: a single-slot blocking handoff between a producer and
//!   a consumer, with cancellation through [`CancelToken`].
//! - [`WorkerPool`]: a fixed number of worker threads draining a FIFO queue,
//!   with graceful and forced shutdown.
//!
//! # Quick Start
//!
//! ```no_run
//! use veda_sync::prelude::*;
//!
//! let pool = WorkerPool::new(&PoolConfig::with_threads(2)).unwrap();
//! let channel = HandoffChannel::new();
//!
//! let tx = channel.clone();
//! pool.execute(move || tx.send("hello")).unwrap();
//! assert_eq!(channel.receive(), "hello");
//!
//! pool.shutdown();
//! pool.await_termination();
//! ```

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod cancel;
pub mod config;
pub mod counter;
pub mod error;
pub mod executor;
pub mod handoff;
pub mod prelude;
pub mod telemetry;
pub mod trial;

// Re-export key types at crate root
pub use cancel::CancelToken;
pub use config::{PoolConfig, PoolConfigBuilder};
pub use counter::{Mode, SharedCounter};
pub use error::{Error, Result, TrySendError};
pub use executor::{FailureReporter, Lifecycle, TaskError, TaskId, WorkerPool};
pub use handoff::HandoffChannel;
