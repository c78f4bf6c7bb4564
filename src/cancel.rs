//! Cooperative cancellation for blocked handoff operations.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

type Waker = Box<dyn FnOnce() + Send + 'static>;

struct Inner {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    wakers: Mutex<Vec<(u64, Waker)>>,
}

/// Shared cancellation flag. Clones observe and trigger the same flag.
///
/// Blocking operations register a waker for as long as they wait; `cancel`
/// runs each registered waker once so the blocked unit re-checks the flag.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
                wakers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Set the flag and wake every unit currently blocked on this token.
    /// Calling it again is a no-op.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        // run outside the lock: wakers take other locks
        let wakers = std::mem::take(&mut *self.inner.wakers.lock());
        tracing::debug!(wakers = wakers.len(), "cancel token fired");
        for (_, wake) in wakers {
            wake();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Register `wake` until the returned guard drops. If the token is already
    /// cancelled nothing is registered; the caller sees the flag on its next check.
    pub(crate) fn register<F>(&self, wake: F) -> Registration<'_>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut wakers = self.inner.wakers.lock();
        if self.is_cancelled() {
            return Registration { token: self, id: None };
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        wakers.push((id, Box::new(wake)));
        Registration {
            token: self,
            id: Some(id),
        }
    }

    fn deregister(&self, id: u64) {
        self.inner.wakers.lock().retain(|(waker_id, _)| *waker_id != id);
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.inner.wakers.lock().len()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: Option<u64>,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            self.token.deregister(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_cancel_is_shared_by_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_wakers_run_once() {
        let token = CancelToken::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        let _reg = token.register(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        token.cancel();
        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_dropped_before_cancel() {
        let token = CancelToken::new();
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let h = hits.clone();
            let _reg = token.register(move || {
                h.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(token.registered(), 1);
        }
        assert_eq!(token.registered(), 0);

        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_register_after_cancel_is_noop() {
        let token = CancelToken::new();
        token.cancel();

        let reg = token.register(|| panic!("must not run"));
        assert!(reg.id.is_none());
        assert_eq!(token.registered(), 0);
    }
}
