//! Worker thread loop.
use super::pool::PoolShared;
use super::task::{Task, TaskError};
use crossbeam_channel::Receiver;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

pub type WorkerId = usize;

pub(crate) struct Worker {
    pub id: WorkerId,
    shared: Arc<PoolShared>,
    queue: Receiver<Task>,
}

impl Worker {
    pub fn new(id: WorkerId, shared: Arc<PoolShared>, queue: Receiver<Task>) -> Self {
        Self { id, shared, queue }
    }

    // main loop: recv blocks while the queue is empty and fails only once the
    // pool has dropped its sender and the queue is drained
    pub fn run(self) {
        let _exit = ExitGuard {
            id: self.id,
            shared: &self.shared,
        };
        tracing::debug!(worker = self.id, "worker started");

        while let Ok(task) = self.queue.recv() {
            self.execute_task(task);
        }
    }

    fn execute_task(&self, task: Task) {
        let tid = task.id;
        tracing::trace!(
            worker = self.id,
            task = %tid,
            queued_us = task.queued_for().as_micros() as u64,
            "task dequeued"
        );

        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        let start = Instant::now();
        let result = task.run();
        self.shared.metrics.record_task_execution(start.elapsed());

        if let Err(err) = result {
            match err {
                TaskError::Failed(_) => self.shared.metrics.record_task_failed(),
                TaskError::Panicked(_) => self.shared.metrics.record_task_panic(),
            }

            let reporter = &self.shared.reporter;
            if catch_unwind(AssertUnwindSafe(|| reporter.report(tid, &err))).is_err() {
                tracing::error!(worker = self.id, task = %tid, "failure reporter panicked");
            }
        }

        self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

struct ExitGuard<'a> {
    id: WorkerId,
    shared: &'a PoolShared,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        tracing::debug!(worker = self.id, "worker exiting");
        self.shared.worker_exited();
    }
}
