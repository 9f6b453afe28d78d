//! Cooperative cancellation of a submission
//!
//! A submission runs on its own task so that a dropped HTTP request cannot
//! abort it mid-stage. The request handler holds a [`CancelOnDrop`] guard; if
//! the request goes away the guard fires and the pipeline stops at the next
//! stage boundary, still cleaning up what it owns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Guard that cancels when dropped unless disarmed first
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            inner: self.clone(),
            armed: true,
        }
    }
}

/// Cancels the associated [`Cancellation`] on drop
#[derive(Debug)]
pub struct CancelOnDrop {
    inner: Cancellation,
    armed: bool,
}

impl CancelOnDrop {
    /// Consume the guard without cancelling
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.inner.cancel();
        }
    }
}
