//! Counting module factory backed by [`ScriptedEngine`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use rxfetch_core::{FetchConfiguration, FetchError, FetchModule, FetchModuleFactory};

use crate::engine::ScriptedEngine;

/// Module factory that builds a fresh [`ScriptedEngine`] per call and
/// remembers how often it was invoked.
#[derive(Default)]
pub struct ScriptedFactory {
    builds: AtomicUsize,
    /// Most recent engine built for each namespace.
    engines: Mutex<HashMap<String, Arc<ScriptedEngine>>>,
    failing: Mutex<HashSet<String>>,
    build_delay: Option<Duration>,
}

impl ScriptedFactory {
    /// Create a factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every build, to widen race windows in tests.
    #[must_use]
    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }

    /// Make builds for `namespace` fail.
    pub fn fail_namespace(&self, namespace: impl Into<String>) {
        lock(&self.failing).insert(namespace.into());
    }

    /// Total number of `build` calls, including failed ones.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Engine built most recently for `namespace`.
    pub fn engine(&self, namespace: &str) -> Option<Arc<ScriptedEngine>> {
        lock(&self.engines).get(namespace).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FetchModuleFactory for ScriptedFactory {
    fn build(&self, config: &FetchConfiguration) -> Result<FetchModule, FetchError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.build_delay {
            thread::sleep(delay);
        }

        if lock(&self.failing).contains(&config.namespace) {
            return Err(FetchError::module_construction(
                config.namespace.clone(),
                "scripted failure",
            ));
        }

        let engine = ScriptedEngine::shared(config.namespace.clone());
        lock(&self.engines).insert(config.namespace.clone(), engine.clone());
        Ok(FetchModule::new(engine))
    }
}
