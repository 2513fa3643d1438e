// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Completion tracking for a single pass.
//!
//! A `CountDownLatch` starts at the number of units in the pass.  Each
//! unit counts it down, skips, or reports a failure, exactly once.  The
//! caller blocks in `wait` until the count reaches zero, the first
//! failure arrives, or its `CancelToken` fires, whichever comes first.
//! A latch belongs to one pass and is dropped with it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};

use crate::error::RenderError;

// Poisoning only means some other thread panicked mid-update; the
// counters are still consistent, and a waiter must always be released.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    // Latches currently blocked in `wait` on this token.
    listeners: Mutex<Vec<Weak<LatchShared>>>,
}

/// A cooperative cancellation flag.  Clones share the flag, so one can
/// be handed to another thread and fired while a pass is running.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<TokenInner>);

impl CancelToken {
    /// A token that has not fired.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Fires the token.  Units that have not started will skip their
    /// work, and any latch waiting on this token is woken at once.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        let listeners = lock(&self.0.listeners).clone();
        for latch in listeners.iter().filter_map(Weak::upgrade) {
            latch.wake();
        }
    }

    /// Whether `cancel` has been called on this token or a clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    fn listen(&self, latch: &Arc<LatchShared>) {
        let mut listeners = lock(&self.0.listeners);
        listeners.retain(|l| l.upgrade().is_some());
        listeners.push(Arc::downgrade(latch));
    }
}

#[derive(Debug)]
struct LatchState {
    remaining: usize,
    skipped: usize,
    failure: Option<RenderError>,
}

#[derive(Debug)]
struct LatchShared {
    state: Mutex<LatchState>,
    released: Condvar,
    failed: AtomicBool,
}

impl LatchShared {
    fn wake(&self) {
        let _state = lock(&self.state);
        self.released.notify_all();
    }
}

/// A count-down barrier that also carries the first failure.
#[derive(Debug)]
pub struct CountDownLatch {
    shared: Arc<LatchShared>,
}

impl CountDownLatch {
    /// A latch waiting on `count` units.
    pub fn new(count: usize) -> Self {
        CountDownLatch {
            shared: Arc::new(LatchShared {
                state: Mutex::new(LatchState {
                    remaining: count,
                    skipped: 0,
                    failure: None,
                }),
                released: Condvar::new(),
                failed: AtomicBool::new(false),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<LatchState> {
        lock(&self.shared.state)
    }

    /// Signals that one unit finished its work.
    pub fn count_down(&self) {
        let mut state = self.lock();
        state.remaining = state.remaining.saturating_sub(1);
        if state.remaining == 0 {
            self.shared.released.notify_all();
        }
    }

    /// Signals that one unit gave up without doing its work, because
    /// the pass was cancelled or another unit failed.
    pub fn skip(&self) {
        let mut state = self.lock();
        state.remaining = state.remaining.saturating_sub(1);
        state.skipped += 1;
        if state.remaining == 0 {
            self.shared.released.notify_all();
        }
    }

    /// Signals that one unit failed.  Only the first failure is kept;
    /// the waiter is released straight away.
    pub fn fail(&self, error: RenderError) {
        let mut state = self.lock();
        state.remaining = state.remaining.saturating_sub(1);
        if state.failure.is_none() && !self.shared.failed.load(Ordering::SeqCst) {
            state.failure = Some(error);
        }
        self.shared.failed.store(true, Ordering::SeqCst);
        self.shared.released.notify_all();
    }

    /// Whether any unit has failed.  Outstanding units check this
    /// before starting and skip their work if it is set.
    pub fn is_failed(&self) -> bool {
        self.shared.failed.load(Ordering::SeqCst)
    }

    /// Units that have not yet signalled.
    pub fn remaining(&self) -> usize {
        self.lock().remaining
    }

    /// Blocks until every unit has signalled.  Returns the first
    /// failure as soon as one is reported.  If every unit did its work
    /// the pass is complete, even when the token fired after the last
    /// one finished; otherwise a fired token yields `Interrupted`,
    /// counting both outstanding and skipped units.
    pub fn wait(&self, cancel: &CancelToken) -> Result<(), RenderError> {
        cancel.listen(&self.shared);
        let mut state = self.lock();
        loop {
            if let Some(failure) = state.failure.take() {
                return Err(failure);
            }
            if state.remaining == 0 && state.skipped == 0 {
                return Ok(());
            }
            if cancel.is_cancelled() || state.remaining == 0 {
                return Err(RenderError::Interrupted {
                    remaining: state.remaining + state.skipped,
                });
            }
            state = match self.shared.released.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }
}
