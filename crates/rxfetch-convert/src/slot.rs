//! Single-assignment result slot shared by all views of a bridge.
//!
//! # Concurrency Model
//!
//! - One short-lived `Mutex` per slot; never held while user code runs
//! - Observers are collected under the lock and invoked after it is released
//! - First resolution wins; later ones are rejected

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use rxfetch_core::FetchError;
use tracing::{debug, warn};

/// Terminal outcome held by a slot.
pub type Outcome<T> = Result<T, FetchError>;

/// Boxed observer that consumes the terminal outcome.
pub(crate) type Deliver<T> = Box<dyn FnOnce(Outcome<T>) + Send + 'static>;

enum Waiter<T> {
    /// Eager observer, notified as soon as the outcome exists.
    Push(Deliver<T>),
    /// Backpressured observer, notified once it has signalled demand.
    Pull { demand: bool, deliver: Deliver<T> },
    /// A polled future or stream.
    Task(Waker),
}

struct State<T> {
    outcome: Option<Outcome<T>>,
    waiters: HashMap<u64, Waiter<T>>,
    next_key: u64,
    /// Whether any observer has received the outcome.
    delivered: bool,
}

impl<T> State<T> {
    fn insert(&mut self, waiter: Waiter<T>) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        self.waiters.insert(key, waiter);
        key
    }
}

pub(crate) struct Slot<T> {
    state: Mutex<State<T>>,
}

impl<T> Slot<T> {
    fn with_outcome(outcome: Option<Outcome<T>>) -> Self {
        Self {
            state: Mutex::new(State {
                outcome,
                waiters: HashMap::new(),
                next_key: 0,
                delivered: false,
            }),
        }
    }

    pub(crate) fn pending() -> Self {
        Self::with_outcome(None)
    }

    pub(crate) fn ready(outcome: Outcome<T>) -> Self {
        Self::with_outcome(Some(outcome))
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.lock().outcome.is_some()
    }

    /// Remove a waiter. Returns `false` if it was already gone.
    pub(crate) fn cancel(&self, key: u64) -> bool {
        // Drop the waiter after releasing the lock; its closure may own slot handles.
        let removed = self.lock().waiters.remove(&key);
        removed.is_some()
    }
}

impl<T: Clone> Slot<T> {
    /// Store the outcome and notify every ready waiter.
    pub(crate) fn resolve(&self, outcome: Outcome<T>) -> bool {
        let mut ready = Vec::new();
        let mut wakers = Vec::new();
        {
            let mut state = self.lock();
            if state.outcome.is_some() {
                debug!("Ignoring duplicate resolution of an already resolved bridge");
                return false;
            }

            for (key, waiter) in std::mem::take(&mut state.waiters) {
                match waiter {
                    Waiter::Push(deliver) | Waiter::Pull { demand: true, deliver } => {
                        ready.push(deliver);
                    }
                    Waiter::Task(waker) => wakers.push(waker),
                    held @ Waiter::Pull { demand: false, .. } => {
                        state.waiters.insert(key, held);
                    }
                }
            }

            if !ready.is_empty() {
                state.delivered = true;
            }
            state.outcome = Some(outcome.clone());
        }

        for deliver in ready {
            deliver(outcome.clone());
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Attach an eager observer.
    ///
    /// Returns `None` when the outcome already existed and was delivered
    /// inline.
    pub(crate) fn subscribe_push(&self, deliver: Deliver<T>) -> Option<u64> {
        let mut state = self.lock();
        match state.outcome.clone() {
            Some(outcome) => {
                state.delivered = true;
                drop(state);
                deliver(outcome);
                None
            }
            None => Some(state.insert(Waiter::Push(deliver))),
        }
    }

    /// Attach a backpressured observer with no demand yet.
    pub(crate) fn subscribe_pull(&self, deliver: Deliver<T>) -> u64 {
        self.lock().insert(Waiter::Pull {
            demand: false,
            deliver,
        })
    }

    /// Signal demand for a backpressured observer.
    pub(crate) fn request(&self, key: u64) {
        let mut state = self.lock();
        let Some(outcome) = state.outcome.clone() else {
            if let Some(Waiter::Pull { demand, .. }) = state.waiters.get_mut(&key) {
                *demand = true;
            }
            return;
        };

        if let Some(Waiter::Pull { deliver, .. }) = state.waiters.remove(&key) {
            state.delivered = true;
            drop(state);
            deliver(outcome);
        }
    }

    /// Poll for the outcome on behalf of a future or stream.
    pub(crate) fn poll(&self, key: &mut Option<u64>, cx: &Context<'_>) -> Poll<Outcome<T>> {
        let mut state = self.lock();
        if let Some(outcome) = state.outcome.clone() {
            if let Some(key) = key.take() {
                state.waiters.remove(&key);
            }
            state.delivered = true;
            return Poll::Ready(outcome);
        }

        let waiter = Waiter::Task(cx.waker().clone());
        match *key {
            Some(existing) => {
                state.waiters.insert(existing, waiter);
            }
            None => *key = Some(state.insert(waiter)),
        }
        Poll::Pending
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(Err(error)) = &state.outcome {
            if !state.delivered {
                warn!(%error, "Fetch failure dropped without being observed");
            }
        }
    }
}
