// src/miner/cancel.rs
//! Cooperative cancellation shared by the coordinator and its workers

use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared cancellation signal
///
/// Workers poll [`CancelToken::is_cancelled`] at the top of each iteration.
/// The coordinator waits on [`CancelToken::signal`] inside `select!`, which
/// becomes ready once the token is cancelled (the underlying sender is
/// dropped and the channel disconnects).
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state
    pub fn new() -> Self {
        let (trigger, signal) = crossbeam_channel::bounded(0);
        CancelToken {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Raises the signal; calling it again has no further effect
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        match self.inner.trigger.lock() {
            Ok(mut trigger) => drop(trigger.take()),
            Err(poisoned) => drop(poisoned.into_inner().take()),
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Relaxed)
    }

    /// Receiver that is ready (disconnected) once the token is cancelled
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
