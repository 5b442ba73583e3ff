//! Module factory port.
//!
//! Turns a configuration into a wired-up engine. The registry calls it
//! while holding its lock, so implementations must not call back into
//! the registry.

use std::fmt;
use std::sync::Arc;

use crate::config::FetchConfiguration;
use crate::download::FetchError;

use super::engine::FetchEnginePort;

/// Engine handles produced for one namespace.
#[derive(Clone)]
pub struct FetchModule {
    /// The engine the facade forwards to.
    pub engine: Arc<dyn FetchEnginePort>,
}

impl FetchModule {
    /// Create a module around an engine.
    pub fn new(engine: Arc<dyn FetchEnginePort>) -> Self {
        Self { engine }
    }
}

impl fmt::Debug for FetchModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchModule").finish_non_exhaustive()
    }
}

/// Port for building engine modules from configuration.
pub trait FetchModuleFactory: Send + Sync {
    /// Build the module for `config.namespace`.
    fn build(&self, config: &FetchConfiguration) -> Result<FetchModule, FetchError>;
}

impl<F> FetchModuleFactory for F
where
    F: Fn(&FetchConfiguration) -> Result<FetchModule, FetchError> + Send + Sync,
{
    fn build(&self, config: &FetchConfiguration) -> Result<FetchModule, FetchError> {
        self(config)
    }
}
