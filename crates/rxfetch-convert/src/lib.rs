//! Callback-to-stream bridge for rxfetch.
//!
//! A [`Convertible`] wraps exactly one asynchronous result. The engine
//! completes it through a [`Resolver`]; callers consume it through one of
//! two views over the same slot:
//!
//! - [`Observable`] - eager push: subscribers are notified on resolution,
//!   or immediately when subscribing late
//! - [`Flowable`] - backpressured pull: the outcome is held until the
//!   subscriber signals demand
//!
//! # Example
//!
//! ```
//! use rxfetch_convert::Convertible;
//!
//! let (bridge, resolver) = Convertible::<u32>::pending();
//! let subscription = bridge.flowable().subscribe(|outcome| {
//!     assert_eq!(outcome, Ok(42));
//! });
//!
//! resolver.succeed(42);
//! subscription.request(1);
//! ```

mod convertible;
mod flowable;
mod observable;
mod slot;

pub use convertible::{Convertible, Resolver};
pub use flowable::{FlowSubscription, Flowable};
pub use observable::{Observable, Subscription, Terminal};
pub use slot::Outcome;
