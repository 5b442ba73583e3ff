//! Core domain types and port definitions for rxfetch.
//!
//! - `download` - requests, downloads, queries and the `FetchError` type
//! - `config` - per-namespace instance configuration
//! - `ports` - traits for the external engine, module factory and
//!   configuration source
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod download;
pub mod ports;

// Re-export commonly used types for convenience
pub use config::{
    DEFAULT_CONCURRENT_LIMIT, DEFAULT_NAMESPACE, DEFAULT_PROGRESS_REPORT_INTERVAL_MS,
    FetchConfiguration, MAX_CONCURRENT_LIMIT, validate_configuration,
};
pub use download::{
    BulkAction, Download, DownloadId, DownloadQuery, EnqueueOutcome, FetchError, FetchResult,
    GroupId, NetworkType, Priority, RejectReason, Request, RequestInfo, Selection, Status,
    derive_download_id,
};
pub use ports::{
    Callback, ConfigurationSource, FailureCallback, FetchEnginePort, FetchModule,
    FetchModuleFactory, StaticConfigurationSource,
};
