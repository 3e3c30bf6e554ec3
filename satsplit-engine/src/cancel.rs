//! Cooperative cancellation with an optional deadline

use crate::error::{EngineError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Waker = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    wakers: Mutex<Vec<(u64, Waker)>>,
    next_waker: AtomicU64,
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner")
            .field("cancelled", &self.cancelled)
            .field("deadline", &self.deadline)
            .field("wakers", &self.wakers.lock().len())
            .finish()
    }
}

/// Cancellation signal shared between a caller and the work it started
///
/// Clones observe the same signal. A token fires either when
/// [`cancel`](Self::cancel) is called or when its deadline passes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Token that only fires when cancelled explicitly
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also fires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                deadline: Some(deadline),
                ..Inner::default()
            }),
        }
    }

    /// Token that also fires once `timeout` has elapsed
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Fire the token and run every registered waker
    ///
    /// Only the first call runs the wakers.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let wakers: Vec<Waker> = self
            .inner
            .wakers
            .lock()
            .iter()
            .map(|(_, wake)| wake.clone())
            .collect();
        for wake in wakers {
            wake();
        }
    }

    /// Run `wake` when [`cancel`](Self::cancel) is called
    ///
    /// The waker is removed when the returned guard drops. It is not run
    /// for a passed deadline or for a token that was already cancelled, so
    /// callers check the token after registering.
    pub fn on_cancel(&self, wake: impl Fn() + Send + Sync + 'static) -> WakerGuard {
        let id = self.inner.next_waker.fetch_add(1, Ordering::Relaxed);
        self.inner.wakers.lock().push((id, Arc::new(wake)));
        WakerGuard {
            inner: self.inner.clone(),
            id,
        }
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Whether the token has fired
    pub fn is_cancelled(&self) -> bool {
        self.check().is_err()
    }

    /// `Ok` while the token has not fired, otherwise the matching error
    ///
    /// Explicit cancellation takes precedence over a passed deadline.
    pub fn check(&self) -> Result<()> {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return Err(EngineError::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(EngineError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Registration from [`CancelToken::on_cancel`]; deregisters on drop
#[derive(Debug)]
pub struct WakerGuard {
    inner: Arc<Inner>,
    id: u64,
}

impl Drop for WakerGuard {
    fn drop(&mut self) {
        self.inner.wakers.lock().retain(|(id, _)| *id != self.id);
    }
}
