//! Download engine port definition.
//!
//! The engine owns network I/O, persistence, scheduling and retries. The
//! core only talks to it through this callback contract.
//!
//! # Contract
//!
//! - Every method returns immediately; work happens on engine threads.
//! - For each call, at most one of `on_success` / `on_failure` is invoked,
//!   at most once.
//! - Callbacks may run on any thread, including the caller's.

use crate::download::{
    BulkAction, Download, DownloadId, DownloadQuery, EnqueueOutcome, FetchError, Request,
    RequestInfo, Selection,
};

/// Success continuation handed to the engine.
pub type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Failure continuation handed to the engine.
pub type FailureCallback = Box<dyn FnOnce(FetchError) + Send + 'static>;

/// Port for the external download engine.
pub trait FetchEnginePort: Send + Sync {
    /// Add a single request.
    ///
    /// The returned download carries the engine's normalized identity.
    fn enqueue(&self, request: Request, on_success: Callback<Download>, on_failure: FailureCallback);

    /// Add several requests.
    ///
    /// The engine reports one outcome per request in submission order;
    /// `on_failure` is reserved for failures of the batch as a whole.
    fn enqueue_all(
        &self,
        requests: Vec<Request>,
        on_success: Callback<Vec<EnqueueOutcome>>,
        on_failure: FailureCallback,
    );

    /// List downloads matching a query.
    fn query(
        &self,
        query: DownloadQuery,
        on_success: Callback<Vec<Download>>,
        on_failure: FailureCallback,
    );

    /// Look up one download; `None` when the id is unknown.
    fn get_download(
        &self,
        id: DownloadId,
        on_success: Callback<Option<Download>>,
        on_failure: FailureCallback,
    );

    /// Apply a partial update to an existing download.
    fn update_request(
        &self,
        id: DownloadId,
        info: RequestInfo,
        notify_listeners: bool,
        on_success: Callback<Download>,
        on_failure: FailureCallback,
    );

    /// Apply a state transition to a selection; yields the affected downloads.
    fn apply(
        &self,
        action: BulkAction,
        selection: Selection,
        on_success: Callback<Vec<Download>>,
        on_failure: FailureCallback,
    );

    /// Check whether any download is queued or transferring.
    ///
    /// With `include_added`, downloads in `Status::Added` count as active.
    fn has_active_downloads(
        &self,
        include_added: bool,
        on_success: Callback<bool>,
        on_failure: FailureCallback,
    );

    /// Release engine resources. Called once when the facade closes.
    fn close(&self);
}
