//! Fetch error types.
//!
//! Errors are plain data: they are cloned into every subscriber of a
//! bridge and may cross FFI or process boundaries, so they never wrap
//! non-cloneable types like `std::io::Error`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the engine refused a request during enqueue validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// A download with the same URL and file is already managed.
    RequestAlreadyExists,
    /// Not enough free space at the destination.
    InsufficientStorage,
    /// The request itself is malformed (empty URL, bad path, ...).
    InvalidRequest,
    /// Any other engine-side validation failure.
    Other,
}

impl RejectReason {
    /// Short human-readable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequestAlreadyExists => "request already exists",
            Self::InsufficientStorage => "insufficient storage",
            Self::InvalidRequest => "invalid request",
            Self::Other => "rejected",
        }
    }
}

/// Error type for fetch operations.
///
/// Every variant is delivered as the terminal failure of a
/// `Convertible`; facade calls never return it synchronously.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FetchError {
    /// An operation was attempted after the instance was closed.
    #[error("Instance closed: {namespace}")]
    InstanceClosed {
        /// Namespace of the closed instance.
        namespace: String,
    },

    /// The engine refused the request during enqueue validation.
    #[error("Engine rejected request ({}): {message}", reason.as_str())]
    EngineRejected {
        /// Rejection category.
        reason: RejectReason,
        /// Detailed error message.
        message: String,
    },

    /// A lookup that requires a result found nothing.
    #[error("Not found: {message}")]
    NotFound {
        /// What was not found.
        message: String,
    },

    /// Any other failure reported by the engine.
    #[error("Engine error: {message}")]
    Engine {
        /// Detailed error message.
        message: String,
    },

    /// `get_default_instance` was called before a default configuration was set.
    #[error("Default configuration not set")]
    DefaultConfigurationMissing,

    /// A configuration value failed validation.
    #[error("Invalid configuration `{field}`: {message}")]
    InvalidConfiguration {
        /// Offending field name.
        field: String,
        /// Detailed error message.
        message: String,
    },

    /// The module factory could not wire up an engine for a namespace.
    #[error("Failed to build module for namespace {namespace}: {message}")]
    ModuleConstruction {
        /// Namespace being built.
        namespace: String,
        /// Detailed error message.
        message: String,
    },
}

impl FetchError {
    /// Create an instance-closed error.
    pub fn instance_closed(namespace: impl Into<String>) -> Self {
        Self::InstanceClosed {
            namespace: namespace.into(),
        }
    }

    /// Create an engine rejection.
    pub fn rejected(reason: RejectReason, message: impl Into<String>) -> Self {
        Self::EngineRejected {
            reason,
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a generic engine error.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a module construction error.
    pub fn module_construction(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModuleConstruction {
            namespace: namespace.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the instance is closed.
    #[must_use]
    pub const fn is_instance_closed(&self) -> bool {
        matches!(self, Self::InstanceClosed { .. })
    }

    /// Rejection reason, if the engine refused the request.
    #[must_use]
    pub const fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::EngineRejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InstanceClosed { namespace } => {
                format!("The fetch instance '{namespace}' has been closed. Obtain a new instance.")
            }
            Self::EngineRejected {
                reason: RejectReason::RequestAlreadyExists,
                ..
            } => "This download is already being managed.".to_string(),
            Self::EngineRejected {
                reason: RejectReason::InsufficientStorage,
                ..
            } => "Not enough storage space for this download.".to_string(),
            Self::EngineRejected { message, .. } => format!("Download rejected: {message}"),
            Self::NotFound { message } => format!("Not found: {message}"),
            Self::Engine { message } => message.clone(),
            Self::DefaultConfigurationMissing => {
                "No default configuration has been set.".to_string()
            }
            Self::InvalidConfiguration { field, message } => {
                format!("Invalid setting '{field}': {message}")
            }
            Self::ModuleConstruction { namespace, .. } => {
                format!("Could not start the download engine for '{namespace}'.")
            }
        }
    }
}

/// Convenience result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
