//! Configuration source port.
//!
//! Abstracts where a context-derived default configuration comes from
//! (persisted preferences, environment, a platform context). Concrete
//! sources live outside the core.

use async_trait::async_trait;

use crate::config::FetchConfiguration;
use crate::download::FetchError;

/// Port for loading a configuration.
#[async_trait]
pub trait ConfigurationSource: Send + Sync {
    /// Load the configuration.
    async fn load(&self) -> Result<FetchConfiguration, FetchError>;
}

/// A source that always yields the same configuration.
///
/// Useful for tests and for callers that already hold a value.
#[derive(Debug, Clone)]
pub struct StaticConfigurationSource {
    config: FetchConfiguration,
}

impl StaticConfigurationSource {
    /// Wrap a configuration.
    #[must_use]
    pub const fn new(config: FetchConfiguration) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConfigurationSource for StaticConfigurationSource {
    async fn load(&self) -> Result<FetchConfiguration, FetchError> {
        Ok(self.config.clone())
    }
}
