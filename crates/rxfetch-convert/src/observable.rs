//! Eager (push) view of a bridge.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use rxfetch_core::FetchError;

use crate::slot::{Outcome, Slot};

/// Push view: subscribers are called as soon as the outcome exists.
///
/// Subscribing after resolution replays the outcome immediately on the
/// subscribing thread; subscribing before resolution notifies on the
/// thread that resolves the bridge.
pub struct Observable<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    pub(crate) const fn new(slot: Arc<Slot<T>>) -> Self {
        Self { slot }
    }

    /// Subscribe with a single observer receiving the terminal outcome.
    pub fn subscribe<F>(&self, observer: F) -> Subscription<T>
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let key = self.slot.subscribe_push(Box::new(observer));
        Subscription {
            slot: Arc::downgrade(&self.slot),
            key,
        }
    }

    /// Subscribe with separate success and error observers.
    pub fn subscribe_with<S, E>(&self, on_success: S, on_error: E) -> Subscription<T>
    where
        S: FnOnce(T) + Send + 'static,
        E: FnOnce(FetchError) + Send + 'static,
    {
        self.subscribe(move |outcome| match outcome {
            Ok(value) => on_success(value),
            Err(error) => on_error(error),
        })
    }
}

impl<T: Clone + Send + 'static> IntoFuture for Observable<T> {
    type Output = Outcome<T>;
    type IntoFuture = Terminal<T>;

    fn into_future(self) -> Self::IntoFuture {
        Terminal {
            slot: self.slot,
            key: None,
        }
    }
}

/// Handle to an eager subscription.
///
/// Dropping the handle leaves the subscription in place; call
/// [`Subscription::cancel`] to detach.
pub struct Subscription<T> {
    slot: Weak<Slot<T>>,
    /// `None` when the outcome was delivered during `subscribe`.
    key: Option<u64>,
}

impl<T> Subscription<T> {
    /// Detach this subscriber. Returns `true` if it was still waiting.
    pub fn cancel(&self) -> bool {
        match (self.key, self.slot.upgrade()) {
            (Some(key), Some(slot)) => slot.cancel(key),
            _ => false,
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Future resolving to the terminal outcome of a bridge.
pub struct Terminal<T> {
    slot: Arc<Slot<T>>,
    key: Option<u64>,
}

impl<T: Clone> Future for Terminal<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.slot.poll(&mut this.key, cx)
    }
}

impl<T> Drop for Terminal<T> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.slot.cancel(key);
        }
    }
}
