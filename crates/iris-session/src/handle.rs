//! A cloneable handle for observing and interrupting the session from the host.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

/// Cloneable handle onto a session's in-flight request.
#[derive(Clone)]
pub struct SessionHandle {
    cancel: Arc<Mutex<CancellationToken>>,
    busy: Arc<AtomicBool>,
}

impl SessionHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Abort the in-flight request, if any.
    ///
    /// The session records the abort as an error turn.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Whether a query is waiting on the inference service.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Mark a request as started. A fresh token is installed so an abort
    /// issued while idle does not cancel the next request.
    pub(crate) fn begin(&self) -> (CancellationToken, BusyGuard) {
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();
        self.busy.store(true, Ordering::Release);
        (
            token,
            BusyGuard {
                busy: Arc::clone(&self.busy),
            },
        )
    }
}

/// Clears the busy flag when the request ends, including when the host drops
/// the `submit_query` future.
pub(crate) struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_flag_follows_guard() {
        let handle = SessionHandle::new();
        assert!(!handle.is_busy());
        let (_token, guard) = handle.begin();
        assert!(handle.clone().is_busy());
        drop(guard);
        assert!(!handle.is_busy());
    }

    #[test]
    fn test_abort_while_idle_does_not_poison_next_request() {
        let handle = SessionHandle::new();
        handle.abort();
        let (token, _guard) = handle.begin();
        assert!(!token.is_cancelled());
        handle.abort();
        assert!(token.is_cancelled());
    }
}
