//! Cancellable lock acquisition
//!
//! A blocked reader or writer must be able to give up waiting. The waiter
//! spins briefly, then sleeps on the mutex in bounded slices and checks its
//! `CancelToken` between slices.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::utils::Backoff;
use parking_lot::{Mutex, MutexGuard};

use crate::error::{Result, ScullError};

/// Shared cancellation flag for callers waiting on a device lock
///
/// Clones observe the same flag, so one thread can cancel a wait happening
/// on another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every waiter holding this token to stop waiting
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation so the token can be reused
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Acquire `mutex`, giving up with `Interrupted` once `cancel` fires
///
/// An uncontended lock is taken even if the token is already cancelled;
/// cancellation only interrupts waiting.
pub fn lock_interruptible<'a, T>(
    mutex: &'a Mutex<T>,
    cancel: &CancelToken,
    poll_interval: Duration,
) -> Result<MutexGuard<'a, T>> {
    if let Some(guard) = mutex.try_lock() {
        return Ok(guard);
    }

    let backoff = Backoff::new();
    loop {
        if cancel.is_cancelled() {
            tracing::debug!("lock wait interrupted");
            return Err(ScullError::Interrupted);
        }

        if backoff.is_completed() {
            if let Some(guard) = mutex.try_lock_for(poll_interval) {
                return Ok(guard);
            }
        } else {
            backoff.snooze();
            if let Some(guard) = mutex.try_lock() {
                return Ok(guard);
            }
        }
    }
}
