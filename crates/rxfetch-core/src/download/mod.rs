//! Download domain types, queries, and errors.
//!
//! This module contains pure data types for the download system. No I/O,
//! networking, or runtime dependencies allowed.
//!
//! # Structure
//!
//! - `types` - Requests, downloads, and their enums (`Request`, `Download`, `Status`)
//! - `query` - Query and bulk-action descriptors handed to the engine
//! - `errors` - Error types delivered through bridges

pub mod errors;
pub mod query;
pub mod types;

pub use errors::{FetchError, FetchResult, RejectReason};
pub use query::{BulkAction, DownloadQuery, EnqueueOutcome, Selection};
pub use types::{
    Download, DownloadId, GroupId, NetworkType, Priority, Request, RequestInfo, Status,
    derive_download_id,
};
