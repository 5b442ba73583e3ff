//! Reactive facade over a callback-driven download engine.
//!
//! [`RxFetch`] forwards each operation to a [`FetchEnginePort`] and returns a
//! [`Convertible`] that resolves once the engine answers. Instances are
//! handed out per namespace by an [`InstanceRegistry`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use rxfetch::{FetchConfiguration, FetchError, FetchModule, InstanceRegistry, Request};
//! use rxfetch_testkit::ScriptedEngine;
//!
//! let registry = InstanceRegistry::new(Arc::new(
//!     |config: &FetchConfiguration| -> Result<FetchModule, FetchError> {
//!         Ok(FetchModule::new(ScriptedEngine::shared(config.namespace.clone())))
//!     },
//! ));
//! registry
//!     .set_default_configuration(FetchConfiguration::default())
//!     .unwrap();
//!
//! let fetch = registry.get_default_instance().unwrap();
//! fetch
//!     .enqueue(Request::new("https://example.com/a.bin", "/tmp/a.bin"))
//!     .observable()
//!     .subscribe(|outcome| assert!(outcome.is_ok()));
//! ```

mod facade;
mod registry;

pub use facade::RxFetch;
pub use registry::{
    ClosedInstancePolicy, InstanceRegistry, get_default_instance, get_instance,
    set_default_instance_configuration,
};

// Re-exports so callers need a single dependency.
pub use rxfetch_convert::{
    Convertible, FlowSubscription, Flowable, Observable, Outcome, Resolver, Subscription,
    Terminal,
};
pub use rxfetch_core::{
    BulkAction, ConfigurationSource, DEFAULT_NAMESPACE, Download, DownloadId, DownloadQuery,
    EnqueueOutcome, FetchConfiguration, FetchEnginePort, FetchError, FetchModule,
    FetchModuleFactory, FetchResult, GroupId, NetworkType, Priority, RejectReason, Request,
    RequestInfo, Selection, StaticConfigurationSource, Status,
};
