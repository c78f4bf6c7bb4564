//! Single-slot blocking handoff.
//!
//! One mutex guards the slot; `readable` is signalled when a message lands,
//! `writable` when the slot is emptied. Every wait sits in a loop that
//! re-checks its predicate under the lock, so a `send` that happens before the
//! receiver starts waiting is never lost and spurious wakeups are harmless.

use crate::cancel::CancelToken;
use crate::error::{Error, Result, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

struct Shared<T> {
    slot: Mutex<Option<T>>,
    readable: Condvar,
    writable: Condvar,
}

impl<T> Shared<T> {
    // lock before broadcasting so a waiter between its flag check and its
    // wait cannot miss the wakeup
    fn wake_all(&self) {
        let _slot = self.slot.lock();
        self.readable.notify_all();
        self.writable.notify_all();
    }
}

/// Handoff channel holding at most one message.
///
/// Clones share the slot, so a producer and a consumer each hold their own
/// handle.
pub struct HandoffChannel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> HandoffChannel<T> {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                readable: Condvar::new(),
                writable: Condvar::new(),
            }),
        }
    }

    /// Deposit `message` and wake one receiver. Waits first if a previous
    /// message has not been taken yet.
    pub fn send(&self, message: T) {
        let mut slot = self.shared.slot.lock();
        while slot.is_some() {
            self.shared.writable.wait(&mut slot);
        }
        *slot = Some(message);
        self.shared.readable.notify_one();
    }

    /// Deposit `message` only if the slot is empty, otherwise hand it back.
    pub fn try_send(&self, message: T) -> std::result::Result<(), TrySendError<T>> {
        let mut slot = self.shared.slot.lock();
        if slot.is_some() {
            return Err(TrySendError::Full(message));
        }
        *slot = Some(message);
        self.shared.readable.notify_one();
        Ok(())
    }

    /// Block until a message is available and take it.
    pub fn receive(&self) -> T {
        let mut slot = self.shared.slot.lock();
        loop {
            if let Some(message) = slot.take() {
                self.shared.writable.notify_one();
                return message;
            }
            self.shared.readable.wait(&mut slot);
        }
    }

    /// Take the resident message, if any, without blocking.
    pub fn try_receive(&self) -> Option<T> {
        let message = self.shared.slot.lock().take();
        if message.is_some() {
            self.shared.writable.notify_one();
        }
        message
    }

    /// Like [`receive`](Self::receive) but gives up after `timeout` with
    /// [`Error::Timeout`], leaving the slot untouched. A timeout too large to
    /// represent as a deadline waits without bound.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.shared.slot.lock();
        loop {
            if let Some(message) = slot.take() {
                self.shared.writable.notify_one();
                return Ok(message);
            }
            let Some(deadline) = deadline else {
                self.shared.readable.wait(&mut slot);
                continue;
            };
            if self
                .shared
                .readable
                .wait_until(&mut slot, deadline)
                .timed_out()
                && slot.is_none()
            {
                return Err(Error::Timeout);
            }
        }
    }

    /// Whether a message is waiting in the slot right now.
    pub fn is_full(&self) -> bool {
        self.shared.slot.lock().is_some()
    }
}

impl<T: Send + 'static> HandoffChannel<T> {
    /// Like [`receive`](Self::receive), but returns [`Error::Cancelled`] once
    /// `token` is cancelled. A cancelled receiver never consumes the slot.
    pub fn receive_cancellable(&self, token: &CancelToken) -> Result<T> {
        let _registration = token.register(self.waker());
        let mut slot = self.shared.slot.lock();
        loop {
            if token.is_cancelled() {
                // we may have absorbed the notify meant for another receiver
                if slot.is_some() {
                    self.shared.readable.notify_one();
                }
                return Err(Error::Cancelled);
            }
            if let Some(message) = slot.take() {
                self.shared.writable.notify_one();
                return Ok(message);
            }
            self.shared.readable.wait(&mut slot);
        }
    }

    /// Like [`send`](Self::send), but returns [`Error::Cancelled`] if `token`
    /// fires while waiting for the slot to empty. The message is dropped.
    pub fn send_cancellable(&self, message: T, token: &CancelToken) -> Result<()> {
        let _registration = token.register(self.waker());
        let mut slot = self.shared.slot.lock();
        loop {
            if token.is_cancelled() {
                if slot.is_none() {
                    self.shared.writable.notify_one();
                }
                return Err(Error::Cancelled);
            }
            if slot.is_none() {
                *slot = Some(message);
                self.shared.readable.notify_one();
                return Ok(());
            }
            self.shared.writable.wait(&mut slot);
        }
    }

    fn waker(&self) -> impl FnOnce() + Send + 'static {
        let shared: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        move || {
            if let Some(shared) = shared.upgrade() {
                shared.wake_all();
            }
        }
    }
}

impl<T> Clone for HandoffChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for HandoffChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HandoffChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandoffChannel")
            .field("full", &self.is_full())
            .finish()
    }
}
