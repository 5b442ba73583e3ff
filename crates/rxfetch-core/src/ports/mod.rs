//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - Engine calls are fire-and-forget with a callback pair
//! - No engine internals (threads, storage, HTTP clients) in any signature
//! - Configuration loading is async; everything else is synchronous

pub mod config_source;
pub mod engine;
pub mod module_factory;

pub use config_source::{ConfigurationSource, StaticConfigurationSource};
pub use engine::{Callback, FailureCallback, FetchEnginePort};
pub use module_factory::{FetchModule, FetchModuleFactory};
