//! Instance configuration.
//!
//! A `FetchConfiguration` describes engine behavior for one namespace.
//! It is an immutable value once handed to the registry.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::download::{FetchError, NetworkType};

/// Namespace reserved for the default instance.
pub const DEFAULT_NAMESPACE: &str = "LibGlobalFetchLib";

/// Default number of parallel downloads.
pub const DEFAULT_CONCURRENT_LIMIT: u32 = 1;

/// Default interval between progress reports.
pub const DEFAULT_PROGRESS_REPORT_INTERVAL_MS: u64 = 2000;

/// Upper bound accepted for `concurrent_limit`.
pub const MAX_CONCURRENT_LIMIT: u32 = 64;

/// Configuration for a fetch instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfiguration {
    /// Registry key for the instance built from this configuration.
    pub namespace: String,
    /// Maximum parallel downloads.
    pub concurrent_limit: u32,
    /// Network constraint applied to requests using `NetworkType::GlobalOff`.
    pub global_network_type: NetworkType,
    /// Milliseconds between progress reports.
    pub progress_report_interval_ms: u64,
    /// Automatic retries on failure (0 = never).
    pub auto_retry_max_attempts: u32,
    /// Whether the engine should emit its own logs.
    pub logging_enabled: bool,
    /// Base directory for relative destination paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_directory: Option<PathBuf>,
}

impl Default for FetchConfiguration {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            concurrent_limit: DEFAULT_CONCURRENT_LIMIT,
            global_network_type: NetworkType::All,
            progress_report_interval_ms: DEFAULT_PROGRESS_REPORT_INTERVAL_MS,
            auto_retry_max_attempts: 0,
            logging_enabled: false,
            download_directory: None,
        }
    }
}

impl FetchConfiguration {
    /// Create a configuration for the given namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Check if this configuration targets the default instance.
    #[must_use]
    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the maximum parallel downloads.
    #[must_use]
    pub const fn with_concurrent_limit(mut self, limit: u32) -> Self {
        self.concurrent_limit = limit;
        self
    }

    /// Set the instance-wide network constraint.
    #[must_use]
    pub const fn with_global_network_type(mut self, network_type: NetworkType) -> Self {
        self.global_network_type = network_type;
        self
    }

    /// Set the progress report interval.
    #[must_use]
    pub const fn with_progress_report_interval_ms(mut self, interval_ms: u64) -> Self {
        self.progress_report_interval_ms = interval_ms;
        self
    }

    /// Set the number of automatic retries.
    #[must_use]
    pub const fn with_auto_retry_max_attempts(mut self, attempts: u32) -> Self {
        self.auto_retry_max_attempts = attempts;
        self
    }

    /// Enable or disable engine logging.
    #[must_use]
    pub const fn with_logging_enabled(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    /// Set the base download directory.
    #[must_use]
    pub fn with_download_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.download_directory = Some(directory.into());
        self
    }
}

/// Validate a configuration before building an instance from it.
pub fn validate_configuration(config: &FetchConfiguration) -> Result<(), FetchError> {
    if config.namespace.trim().is_empty() {
        return Err(FetchError::invalid_configuration(
            "namespace",
            "must not be empty",
        ));
    }

    if config.concurrent_limit == 0 || config.concurrent_limit > MAX_CONCURRENT_LIMIT {
        return Err(FetchError::invalid_configuration(
            "concurrent_limit",
            format!("must be between 1 and {MAX_CONCURRENT_LIMIT}"),
        ));
    }

    if config.global_network_type == NetworkType::GlobalOff {
        return Err(FetchError::invalid_configuration(
            "global_network_type",
            "GlobalOff is only valid on individual requests",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_default_namespace() {
        let config = FetchConfiguration::default();
        assert!(config.is_default_namespace());
        assert!(validate_configuration(&config).is_ok());
    }

    #[test]
    fn test_builder() {
        let config = FetchConfiguration::new("podcasts")
            .with_concurrent_limit(4)
            .with_logging_enabled(true)
            .with_download_directory("/var/tmp");

        assert!(!config.is_default_namespace());
        assert_eq!(config.concurrent_limit, 4);
        assert!(config.logging_enabled);
        assert_eq!(config.download_directory, Some(PathBuf::from("/var/tmp")));
    }

    #[test]
    fn test_validate_rejects_empty_namespace() {
        let err = validate_configuration(&FetchConfiguration::new("  ")).unwrap_err();
        assert!(matches!(err, FetchError::InvalidConfiguration { ref field, .. } if field == "namespace"));
    }

    #[test]
    fn test_validate_concurrent_limit_bounds() {
        let zero = FetchConfiguration::default().with_concurrent_limit(0);
        assert!(validate_configuration(&zero).is_err());

        let too_many = FetchConfiguration::default().with_concurrent_limit(MAX_CONCURRENT_LIMIT + 1);
        assert!(validate_configuration(&too_many).is_err());
    }

    #[test]
    fn test_validate_rejects_global_off() {
        let config =
            FetchConfiguration::default().with_global_network_type(NetworkType::GlobalOff);
        assert!(validate_configuration(&config).is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: FetchConfiguration =
            serde_json::from_str(r#"{"namespace":"music","concurrent_limit":3}"#).unwrap();
        assert_eq!(config.namespace, "music");
        assert_eq!(config.concurrent_limit, 3);
        assert_eq!(
            config.progress_report_interval_ms,
            DEFAULT_PROGRESS_REPORT_INTERVAL_MS
        );
    }
}
