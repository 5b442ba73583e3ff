//! Backpressured (pull) view of a bridge.
//!
//! Nothing is delivered until the subscriber signals demand. An outcome
//! that arrives earlier is held until then, or until the subscriber
//! cancels.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::{FusedStream, Stream};
use rxfetch_core::FetchError;
use tracing::warn;

use crate::slot::{Outcome, Slot};

/// Pull view of a bridge.
///
/// Either subscribe with explicit demand via [`Flowable::subscribe`], or
/// poll it as a [`Stream`], where each poll is the demand signal. The
/// stream yields exactly one item and then ends.
pub struct Flowable<T> {
    slot: Arc<Slot<T>>,
    /// Waker registration while polled as a stream.
    key: Option<u64>,
    done: bool,
}

impl<T> Clone for Flowable<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            key: None,
            done: false,
        }
    }
}

impl<T> fmt::Debug for Flowable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flowable")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Flowable<T> {
    pub(crate) const fn new(slot: Arc<Slot<T>>) -> Self {
        Self {
            slot,
            key: None,
            done: false,
        }
    }

    /// Subscribe without demand. Call [`FlowSubscription::request`] to
    /// receive the outcome.
    pub fn subscribe<F>(&self, subscriber: F) -> FlowSubscription<T>
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let key = self.slot.subscribe_pull(Box::new(subscriber));
        FlowSubscription {
            slot: self.slot.clone(),
            key,
        }
    }

    /// Subscribe with separate success and error handlers.
    pub fn subscribe_with<S, E>(&self, on_success: S, on_error: E) -> FlowSubscription<T>
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

impl<T: Clone> Stream for Flowable<T> {
    type Item = Outcome<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        match this.slot.poll(&mut this.key, cx) {
            Poll::Ready(outcome) => {
                this.done = true;
                Poll::Ready(Some(outcome))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done { (0, Some(0)) } else { (1, Some(1)) }
    }
}

impl<T: Clone> FusedStream for Flowable<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl<T> Drop for Flowable<T> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.slot.cancel(key);
        }
    }
}

/// Handle to a backpressured subscription.
///
/// The handle keeps the held outcome alive until it is requested. Dropping
/// the handle cancels the subscription.
pub struct FlowSubscription<T> {
    slot: Arc<Slot<T>>,
    key: u64,
}

impl<T: Clone> FlowSubscription<T> {
    /// Signal readiness for `n` elements.
    ///
    /// A bridge carries a single element, so any positive `n` releases it.
    /// `n == 0` is ignored.
    pub fn request(&self, n: u64) {
        if n == 0 {
            warn!("Ignoring request for zero elements");
            return;
        }
        self.slot.request(self.key);
    }
}

impl<T> FlowSubscription<T> {
    /// Detach this subscriber. Returns `true` if it was still waiting.
    pub fn cancel(&self) -> bool {
        self.slot.cancel(self.key)
    }
}

impl<T> Drop for FlowSubscription<T> {
    fn drop(&mut self) {
        self.slot.cancel(self.key);
    }
}

impl<T> fmt::Debug for FlowSubscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowSubscription")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
