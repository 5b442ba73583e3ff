//! The bridge handle and its resolver.

use std::fmt;
use std::sync::Arc;

use rxfetch_core::{Callback, FailureCallback, FetchError};

use crate::flowable::Flowable;
use crate::observable::Observable;
use crate::slot::{Outcome, Slot};

/// One asynchronous result, consumable as a push or pull stream of
/// exactly one terminal element.
///
/// Cloning a `Convertible` yields another handle to the same result.
pub struct Convertible<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Clone for Convertible<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> fmt::Debug for Convertible<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Convertible")
            .field("resolved", &self.slot.is_resolved())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Convertible<T> {
    /// Create an unresolved bridge and the resolver that completes it.
    #[must_use]
    pub fn pending() -> (Self, Resolver<T>) {
        let slot = Arc::new(Slot::pending());
        (Self { slot: slot.clone() }, Resolver { slot })
    }

    /// Create a bridge that is already resolved.
    #[must_use]
    pub fn ready(outcome: Outcome<T>) -> Self {
        Self {
            slot: Arc::new(Slot::ready(outcome)),
        }
    }

    /// Create a bridge already resolved to a value.
    #[must_use]
    pub fn succeeded(value: T) -> Self {
        Self::ready(Ok(value))
    }

    /// Create a bridge already resolved to a failure.
    #[must_use]
    pub fn failed(error: FetchError) -> Self {
        Self::ready(Err(error))
    }

    /// Eager, push-on-subscribe view.
    #[must_use]
    pub fn observable(&self) -> Observable<T> {
        Observable::new(self.slot.clone())
    }

    /// Demand-driven view.
    #[must_use]
    pub fn flowable(&self) -> Flowable<T> {
        Flowable::new(self.slot.clone())
    }

    /// Check whether the terminal outcome is known.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.slot.is_resolved()
    }
}

/// Write side of a [`Convertible`].
///
/// Clones share the same slot; only the first resolution through any of
/// them takes effect.
pub struct Resolver<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("resolved", &self.slot.is_resolved())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Resolver<T> {
    /// Store the outcome. Returns `false` if the bridge was already resolved.
    pub fn resolve(&self, outcome: Outcome<T>) -> bool {
        self.slot.resolve(outcome)
    }

    /// Resolve with a value.
    pub fn succeed(&self, value: T) -> bool {
        self.resolve(Ok(value))
    }

    /// Resolve with a failure.
    pub fn fail(&self, error: FetchError) -> bool {
        self.resolve(Err(error))
    }

    /// Engine success callback that resolves with the value as-is.
    #[must_use]
    pub fn success_callback(&self) -> Callback<T> {
        let resolver = self.clone();
        Box::new(move |value| {
            resolver.succeed(value);
        })
    }

    /// Engine success callback that converts the engine's payload first.
    #[must_use]
    pub fn success_callback_with<U, F>(&self, convert: F) -> Callback<U>
    where
        U: 'static,
        F: FnOnce(U) -> Outcome<T> + Send + 'static,
    {
        let resolver = self.clone();
        Box::new(move |payload| {
            resolver.resolve(convert(payload));
        })
    }

    /// Engine failure callback.
    #[must_use]
    pub fn failure_callback(&self) -> FailureCallback {
        let resolver = self.clone();
        Box::new(move |error| {
            resolver.fail(error);
        })
    }

    /// The `(on_success, on_failure)` pair handed to an engine call.
    #[must_use]
    pub fn callbacks(&self) -> (Callback<T>, FailureCallback) {
        (self.success_callback(), self.failure_callback())
    }
}
