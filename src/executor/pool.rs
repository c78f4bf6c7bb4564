use super::reporter::{FailureReporter, TracingReporter};
use super::task::{Task, TaskId};
use super::worker::{Worker, WorkerId};
use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::telemetry::{Metrics, MetricsSnapshot};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lifecycle of a [`WorkerPool`]. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Running => "running",
            Lifecycle::Draining => "draining",
            Lifecycle::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct PoolState {
    lifecycle: Lifecycle,
    // dropped on shutdown; workers see a disconnected queue once it drains
    sender: Option<Sender<Task>>,
    live_workers: usize,
}

pub(crate) struct PoolShared {
    state: Mutex<PoolState>,
    terminated: Condvar,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) reporter: Arc<dyn FailureReporter>,
    pub(crate) metrics: Metrics,
}

impl PoolShared {
    pub(crate) fn worker_exited(&self) {
        let mut state = self.state.lock();
        state.live_workers = state.live_workers.saturating_sub(1);
        if state.live_workers == 0 {
            Self::stop(&mut state, &self.terminated);
        }
    }

    // close the queue; with no workers left there is nothing to drain
    fn close(&self, state: &mut PoolState) {
        state.lifecycle = Lifecycle::Draining;
        state.sender = None;
        if state.live_workers == 0 {
            Self::stop(state, &self.terminated);
        }
    }

    fn stop(state: &mut PoolState, terminated: &Condvar) {
        if state.lifecycle != Lifecycle::Stopped {
            state.lifecycle = Lifecycle::Stopped;
            tracing::info!("worker pool stopped");
            terminated.notify_all();
        }
    }
}

/// Fixed-size pool of worker threads consuming a shared FIFO queue.
///
/// At most `num_threads` tasks run at once. [`shutdown`](Self::shutdown)
/// stops admission and lets queued tasks drain; [`shutdown_now`](Self::shutdown_now)
/// also discards whatever no worker has picked up yet.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    queue: Receiver<Task>,
    workers: Vec<WorkerHandle>,
    num_threads: usize,
}

struct WorkerHandle {
    id: WorkerId,
    thread: Option<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn the workers. Task failures are logged through [`TracingReporter`].
    pub fn new(config: &PoolConfig) -> Result<Self> {
        Self::with_reporter(config, Arc::new(TracingReporter))
    }

    pub fn with_reporter(config: &PoolConfig, reporter: Arc<dyn FailureReporter>) -> Result<Self> {
        config.validate()?;
        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let (sender, queue) = unbounded();
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                lifecycle: Lifecycle::Running,
                sender: Some(sender),
                live_workers: num_threads,
            }),
            terminated: Condvar::new(),
            in_flight: AtomicUsize::new(0),
            reporter,
            metrics: Metrics::new(),
        });

        let mut workers = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id, shared.clone(), queue.clone());
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);

            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            match builder.spawn(move || worker.run()) {
                Ok(thread) => workers.push(WorkerHandle {
                    id,
                    thread: Some(thread),
                }),
                Err(e) => {
                    // the workers already running exit once the queue closes
                    let mut state = shared.state.lock();
                    state.live_workers = id;
                    shared.close(&mut state);
                    return Err(Error::executor(format!("spawn failed: {}", e)));
                }
            }
        }

        tracing::info!(workers = num_threads, "worker pool started");

        Ok(Self {
            shared,
            queue,
            workers,
            num_threads,
        })
    }

    /// Queue a fallible task. Returns as soon as the task is enqueued.
    ///
    /// An `Err` returned by the task, or a panic inside it, is passed to the
    /// pool's reporter and never surfaces here.
    pub fn submit<F, E>(&self, f: F) -> Result<TaskId>
    where
        F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        let task = Task::new(f);
        let id = task.id;

        let state = self.shared.state.lock();
        let sender = match (&state.lifecycle, &state.sender) {
            (Lifecycle::Running, Some(sender)) => sender,
            _ => return Err(Error::PoolClosed),
        };

        self.shared.metrics.record_submitted();
        sender.send(task).map_err(|_| Error::PoolClosed)?;
        Ok(id)
    }

    /// Queue a task that cannot fail.
    pub fn execute<F>(&self, f: F) -> Result<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(move || {
            f();
            Ok::<(), std::convert::Infallible>(())
        })
    }

    /// Stop accepting tasks and let the queue drain. Safe to call repeatedly.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        if state.lifecycle != Lifecycle::Running {
            return;
        }
        tracing::info!(pending = self.queue.len(), "worker pool draining");
        self.shared.close(&mut state);
    }

    /// Shut down and discard every task no worker has dequeued yet.
    /// Returns the ids of the discarded tasks in queue order.
    pub fn shutdown_now(&self) -> Vec<TaskId> {
        self.shutdown();

        let discarded: Vec<TaskId> = self.queue.try_iter().map(|task| task.id).collect();
        if !discarded.is_empty() {
            self.shared.metrics.record_discarded(discarded.len());
            tracing::info!(discarded = discarded.len(), "discarded queued tasks");
        }
        discarded
    }

    /// Block until the pool is [`Lifecycle::Stopped`]. Never returns unless
    /// some caller shuts the pool down.
    pub fn await_termination(&self) {
        let mut state = self.shared.state.lock();
        while state.lifecycle != Lifecycle::Stopped {
            self.shared.terminated.wait(&mut state);
        }
    }

    /// Like [`await_termination`](Self::await_termination) with an upper
    /// bound. Returns whether the pool stopped in time. A timeout too large
    /// to represent as a deadline waits without bound.
    pub fn await_termination_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.await_termination();
            return true;
        };
        let mut state = self.shared.state.lock();
        while state.lifecycle != Lifecycle::Stopped {
            if self
                .shared
                .terminated
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.lifecycle == Lifecycle::Stopped;
            }
        }
        true
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.state.lock().lifecycle
    }

    pub fn is_terminated(&self) -> bool {
        self.lifecycle() == Lifecycle::Stopped
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Tasks queued but not yet picked up by a worker
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Tasks currently executing
    pub fn active_tasks(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads)
            .field("lifecycle", &self.lifecycle())
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();

        let current = thread::current().id();
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                // a task dropping its own pool cannot join itself
                if thread.thread().id() == current {
                    continue;
                }
                if thread.join().is_err() {
                    tracing::error!(worker = worker.id, "worker thread panicked");
                }
            }
        }
    }
}
