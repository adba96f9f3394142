//! Cooperative cancellation of in-flight fetches.
//!
//! A [`CancelToken`] is shared between the fetch pipeline and whatever may
//! cancel it, typically a signal handler. Cancelling latches a flag that the
//! pipeline checks between stages and interrupts the SQLite statement
//! currently executing, so a long-running query stops promptly instead of at
//! the next stage boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::InterruptHandle;

/// Shared cancellation token for fetches.
///
/// Clones share the same state. Cancellation latches: once cancelled, a
/// token stays cancelled.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    interrupt: Mutex<Option<InterruptHandle>>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// Latches the cancelled flag and interrupts any statement executing on
    /// the connection currently armed with this token. Idempotent, and safe
    /// to call from another thread.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.slot().as_ref() {
            handle.interrupt();
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Point this token's interrupt at a connection for the returned guard's
    /// lifetime. A cancel that races the arming is caught by the pipeline's
    /// flag check immediately after.
    pub(crate) fn arm(&self, handle: InterruptHandle) -> ArmedToken<'_> {
        *self.slot() = Some(handle);
        ArmedToken { token: self }
    }

    fn slot(&self) -> MutexGuard<'_, Option<InterruptHandle>> {
        match self.inner.interrupt.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Clears the armed interrupt handle when the fetch scope ends.
pub(crate) struct ArmedToken<'a> {
    token: &'a CancelToken,
}

impl Drop for ArmedToken<'_> {
    fn drop(&mut self) {
        *self.token.slot() = None;
    }
}
