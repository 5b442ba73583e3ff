//! Namespace-keyed registry of facade instances.
//!
//! # Concurrency Model
//!
//! - One coarse `Mutex` guards the default configuration and the
//!   namespace map
//! - Held for get-or-create only; module construction happens inside it,
//!   engine shutdown happens outside it
//! - Evicted instances are marked closed before the lock is released
//! - At most one live instance per namespace

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rxfetch_core::{
    ConfigurationSource, DEFAULT_NAMESPACE, FetchConfiguration, FetchError, FetchModuleFactory,
    FetchResult, validate_configuration,
};
use tracing::{debug, info};

use crate::facade::RxFetch;

/// What `get_default_instance` does when the cached default instance has
/// been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosedInstancePolicy {
    /// Keep returning the closed instance until it is removed explicitly.
    #[default]
    Retain,
    /// Build a fresh instance from the stored default configuration.
    Replace,
}

#[derive(Default)]
struct RegistryState {
    default_config: Option<FetchConfiguration>,
    instances: HashMap<String, Arc<RxFetch>>,
}

/// Registry handing out shared facade instances per namespace.
pub struct InstanceRegistry {
    factory: Arc<dyn FetchModuleFactory>,
    policy: ClosedInstancePolicy,
    state: Mutex<RegistryState>,
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("policy", &self.policy)
            .field("namespaces", &self.namespaces())
            .finish_non_exhaustive()
    }
}

impl InstanceRegistry {
    /// Create an empty registry that builds modules with `factory`.
    pub fn new(factory: Arc<dyn FetchModuleFactory>) -> Self {
        Self {
            factory,
            policy: ClosedInstancePolicy::default(),
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Set how a closed default instance is handled.
    #[must_use]
    pub const fn with_policy(mut self, policy: ClosedInstancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The closed-default-instance policy in effect.
    #[must_use]
    pub const fn policy(&self) -> ClosedInstancePolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the configuration used for the default instance.
    ///
    /// The namespace is forced to [`DEFAULT_NAMESPACE`]. An existing open
    /// default instance keeps its original configuration.
    pub fn set_default_configuration(&self, config: FetchConfiguration) -> FetchResult<()> {
        let config = normalize_default(config);
        validate_configuration(&config)?;
        self.lock().default_config = Some(config);
        Ok(())
    }

    /// Load the default configuration from `source` and store it.
    ///
    /// Loading happens outside the registry lock.
    pub async fn set_default_configuration_from(
        &self,
        source: &dyn ConfigurationSource,
    ) -> FetchResult<FetchConfiguration> {
        let config = normalize_default(source.load().await?);
        validate_configuration(&config)?;
        self.lock().default_config = Some(config.clone());
        debug!("Default configuration loaded from source");
        Ok(config)
    }

    /// The stored default configuration.
    pub fn default_configuration(&self) -> FetchResult<FetchConfiguration> {
        self.lock()
            .default_config
            .clone()
            .ok_or(FetchError::DefaultConfigurationMissing)
    }

    /// The default instance, built on first use from the stored
    /// configuration.
    pub fn get_default_instance(&self) -> FetchResult<Arc<RxFetch>> {
        let mut state = self.lock();
        self.default_instance_locked(&mut state)
    }

    /// The instance for `config.namespace`, built when absent or closed.
    ///
    /// A configuration carrying [`DEFAULT_NAMESPACE`] is stored as the
    /// default configuration and resolved like
    /// [`InstanceRegistry::get_default_instance`]. For other namespaces an
    /// existing open instance is returned as-is, even if `config` differs
    /// from the one it was built with.
    pub fn get_instance(&self, config: FetchConfiguration) -> FetchResult<Arc<RxFetch>> {
        validate_configuration(&config)?;
        let mut state = self.lock();

        if config.namespace == DEFAULT_NAMESPACE {
            state.default_config = Some(config);
            return self.default_instance_locked(&mut state);
        }

        if let Some(existing) = state.instances.get(&config.namespace) {
            if !existing.is_closed() {
                if existing.configuration() != &config {
                    debug!(
                        namespace = %config.namespace,
                        "Namespace already has a live instance; ignoring new configuration"
                    );
                }
                return Ok(existing.clone());
            }
        }

        self.build_locked(&mut state, config)
    }

    /// Live (or retained closed) instance for `namespace`, without building.
    #[must_use]
    pub fn instance(&self, namespace: &str) -> Option<Arc<RxFetch>> {
        self.lock().instances.get(namespace).cloned()
    }

    /// Evict and close the instance for `namespace`.
    ///
    /// The instance is marked closed before the lock is released; its
    /// engine is released afterwards.
    pub fn remove(&self, namespace: &str) -> Option<Arc<RxFetch>> {
        let (removed, closing) = {
            let mut state = self.lock();
            let removed = state.instances.remove(namespace)?;
            let closing = removed.mark_closed();
            (removed, closing)
        };

        if closing {
            removed.release_engine();
        }
        debug!(%namespace, "Removed fetch instance");
        Some(removed)
    }

    /// Namespaces with a registered instance, sorted.
    #[must_use]
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().instances.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().instances.len()
    }

    /// Check if no instance is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().instances.is_empty()
    }

    /// Close every instance and empty the registry.
    ///
    /// The stored default configuration is kept.
    pub fn shutdown(&self) {
        let closing: Vec<Arc<RxFetch>> = {
            let mut state = self.lock();
            state
                .instances
                .drain()
                .map(|(_, instance)| instance)
                .filter(|instance| instance.mark_closed())
                .collect()
        };

        for instance in &closing {
            instance.release_engine();
        }
        info!(closed = closing.len(), "Instance registry shut down");
    }

    fn default_instance_locked(&self, state: &mut RegistryState) -> FetchResult<Arc<RxFetch>> {
        if let Some(existing) = state.instances.get(DEFAULT_NAMESPACE) {
            if !existing.is_closed() || self.policy == ClosedInstancePolicy::Retain {
                return Ok(existing.clone());
            }
        }

        let config = state
            .default_config
            .clone()
            .ok_or(FetchError::DefaultConfigurationMissing)?;
        self.build_locked(state, config)
    }

    fn build_locked(
        &self,
        state: &mut RegistryState,
        config: FetchConfiguration,
    ) -> FetchResult<Arc<RxFetch>> {
        let namespace = config.namespace.clone();
        let module = self.factory.build(&config)?;
        let instance = Arc::new(RxFetch::new(config, module));

        if state.instances.insert(namespace.clone(), instance.clone()).is_some() {
            info!(%namespace, "Replaced closed fetch instance");
        } else {
            info!(%namespace, "Created fetch instance");
        }
        Ok(instance)
    }
}

fn normalize_default(mut config: FetchConfiguration) -> FetchConfiguration {
    if config.namespace != DEFAULT_NAMESPACE {
        debug!(
            namespace = %config.namespace,
            "Overriding namespace of default configuration"
        );
        config.namespace = DEFAULT_NAMESPACE.to_string();
    }
    config
}

// ─────────────────────────────────────────────────────────────────────────────
// Free functions over an explicit registry handle
// ─────────────────────────────────────────────────────────────────────────────

/// Store the default configuration on `registry`.
pub fn set_default_instance_configuration(
    registry: &InstanceRegistry,
    config: FetchConfiguration,
) -> FetchResult<()> {
    registry.set_default_configuration(config)
}

/// Get or build the default instance on `registry`.
pub fn get_default_instance(registry: &InstanceRegistry) -> FetchResult<Arc<RxFetch>> {
    registry.get_default_instance()
}

/// Get or build the instance for `config.namespace` on `registry`.
pub fn get_instance(
    registry: &InstanceRegistry,
    config: FetchConfiguration,
) -> FetchResult<Arc<RxFetch>> {
    registry.get_instance(config)
}
