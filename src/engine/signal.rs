// src/engine/signal.rs

//! One-shot completion latch shared by the execute and watch tasks.
//!
//! The execute task is the only writer and flips the flag exactly once,
//! through a [`CompletionGuard`] so the flip also happens on error or panic.
//! The watch task reads the flag after every sleep and can additionally
//! `wait()` on it to cut a sleep short.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    done: AtomicBool,
    notify: Notify,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionSignal {
    inner: Arc<Inner>,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.inner.done.load(Ordering::Acquire)
    }

    /// Set the flag and wake every waiter. Later calls are no-ops.
    pub fn set(&self) {
        if !self.inner.done.swap(true, Ordering::AcqRel) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Resolve once the flag is set.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking, otherwise a `set()` in between is lost.
            notified.as_mut().enable();

            if self.is_set() {
                return;
            }
            notified.await;
        }
    }

    /// Guard that sets the signal when dropped.
    pub fn guard(&self) -> CompletionGuard {
        CompletionGuard {
            signal: self.clone(),
        }
    }
}

/// Sets its [`CompletionSignal`] on drop, including during unwinding.
#[derive(Debug)]
pub struct CompletionGuard {
    signal: CompletionSignal,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.signal.set();
    }
}
