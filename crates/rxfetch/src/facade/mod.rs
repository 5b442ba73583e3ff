//! The public operation surface.
//!
//! Every method follows one pattern: check the instance is open, hand the
//! engine a callback pair from a fresh [`Resolver`], return the
//! [`Convertible`] immediately. Nothing here blocks or returns an error
//! at call time; failures surface when the bridge is consumed.

mod batch;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rxfetch_convert::{Convertible, Resolver};
use rxfetch_core::{
    BulkAction, Download, DownloadId, DownloadQuery, FetchConfiguration, FetchEnginePort,
    FetchError, FetchModule, GroupId, Request, RequestInfo, Selection, Status,
};
use tracing::{debug, info};

use batch::collect_batch;

/// Facade over one engine instance.
pub struct RxFetch {
    config: FetchConfiguration,
    engine: Arc<dyn FetchEnginePort>,
    closed: AtomicBool,
}

impl fmt::Debug for RxFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxFetch")
            .field("namespace", &self.config.namespace)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl RxFetch {
    /// Wrap a module built for `config`.
    pub fn new(config: FetchConfiguration, module: FetchModule) -> Self {
        Self {
            config,
            engine: module.engine,
            closed: AtomicBool::new(false),
        }
    }

    /// Namespace this instance serves.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Configuration this instance was built from.
    #[must_use]
    pub const fn configuration(&self) -> &FetchConfiguration {
        &self.config
    }

    /// Check whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the instance and release the engine.
    ///
    /// Idempotent. Bridges already handed out still resolve if the engine
    /// answers them; new calls resolve to `InstanceClosed`.
    pub fn close(&self) {
        if self.mark_closed() {
            self.release_engine();
        }
    }

    /// Flag the instance closed. Returns `true` for the call that closed it.
    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Release the engine of an instance already marked closed.
    pub(crate) fn release_engine(&self) {
        self.engine.close();
        info!(namespace = %self.config.namespace, "Fetch instance closed");
    }

    /// Guard + bridge creation shared by every operation.
    fn call<T, F>(&self, operation: &'static str, invoke: F) -> Convertible<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce(&dyn FetchEnginePort, &Resolver<T>),
    {
        if self.is_closed() {
            debug!(
                namespace = %self.config.namespace,
                operation,
                "Rejecting call on closed instance"
            );
            return Convertible::failed(FetchError::instance_closed(self.config.namespace.clone()));
        }

        let (bridge, resolver) = Convertible::pending();
        invoke(self.engine.as_ref(), &resolver);
        bridge
    }

    fn list(&self, operation: &'static str, query: DownloadQuery) -> Convertible<Vec<Download>> {
        self.call(operation, |engine, resolver| {
            let (on_success, on_failure) = resolver.callbacks();
            engine.query(query, on_success, on_failure);
        })
    }

    fn bulk(
        &self,
        operation: &'static str,
        action: BulkAction,
        selection: Selection,
    ) -> Convertible<Vec<Download>> {
        self.call(operation, |engine, resolver| {
            let (on_success, on_failure) = resolver.callbacks();
            engine.apply(action, selection, on_success, on_failure);
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Enqueue
    // ─────────────────────────────────────────────────────────────────────

    /// Queue a request. The resolved download's identity is authoritative.
    pub fn enqueue(&self, request: Request) -> Convertible<Download> {
        self.call("enqueue", |engine, resolver| {
            let (on_success, on_failure) = resolver.callbacks();
            engine.enqueue(request, on_success, on_failure);
        })
    }

    /// Queue several requests, all or nothing.
    ///
    /// If the engine refuses any request, the bridge fails with that
    /// request's error and no partial list is reported.
    pub fn enqueue_all(&self, requests: Vec<Request>) -> Convertible<Vec<Download>> {
        self.call("enqueue_all", |engine, resolver| {
            let on_success = resolver.success_callback_with(collect_batch);
            engine.enqueue_all(requests, on_success, resolver.failure_callback());
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// All downloads managed by this instance.
    pub fn get_downloads(&self) -> Convertible<Vec<Download>> {
        self.list("get_downloads", DownloadQuery::All)
    }

    /// Downloads with the given ids. Unknown ids are skipped.
    pub fn get_downloads_with_ids(&self, ids: Vec<DownloadId>) -> Convertible<Vec<Download>> {
        self.list("get_downloads_with_ids", DownloadQuery::Ids(ids))
    }

    /// A single download; fails with `NotFound` when the id is unknown.
    pub fn get_download(&self, id: DownloadId) -> Convertible<Download> {
        self.call("get_download", |engine, resolver| {
            let on_success = resolver.success_callback_with(move |found: Option<Download>| {
                found.ok_or_else(|| FetchError::not_found(format!("download {id}")))
            });
            engine.get_download(id, on_success, resolver.failure_callback());
        })
    }

    /// Downloads in a group.
    pub fn get_downloads_in_group(&self, group: GroupId) -> Convertible<Vec<Download>> {
        self.list("get_downloads_in_group", DownloadQuery::Group(group))
    }

    /// Downloads in any of the given states.
    pub fn get_downloads_with_status(&self, statuses: Vec<Status>) -> Convertible<Vec<Download>> {
        self.list("get_downloads_with_status", DownloadQuery::Status(statuses))
    }

    /// Downloads in a group that are in any of the given states.
    pub fn get_downloads_in_group_with_status(
        &self,
        group: GroupId,
        statuses: Vec<Status>,
    ) -> Convertible<Vec<Download>> {
        self.list(
            "get_downloads_in_group_with_status",
            DownloadQuery::GroupWithStatus(group, statuses),
        )
    }

    /// Downloads whose request carried `identifier`.
    pub fn get_downloads_by_request_identifier(
        &self,
        identifier: i64,
    ) -> Convertible<Vec<Download>> {
        self.list(
            "get_downloads_by_request_identifier",
            DownloadQuery::RequestIdentifier(identifier),
        )
    }

    /// Check whether anything is queued or downloading.
    pub fn has_active_downloads(&self, include_added: bool) -> Convertible<bool> {
        self.call("has_active_downloads", |engine, resolver| {
            let (on_success, on_failure) = resolver.callbacks();
            engine.has_active_downloads(include_added, on_success, on_failure);
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Updates
    // ─────────────────────────────────────────────────────────────────────

    /// Apply a partial update to an existing download.
    pub fn update_request(
        &self,
        id: DownloadId,
        info: RequestInfo,
        notify_listeners: bool,
    ) -> Convertible<Download> {
        self.call("update_request", |engine, resolver| {
            let (on_success, on_failure) = resolver.callbacks();
            engine.update_request(id, info, notify_listeners, on_success, on_failure);
        })
    }

    /// Pause downloads by id.
    pub fn pause(&self, ids: Vec<DownloadId>) -> Convertible<Vec<Download>> {
        self.bulk("pause", BulkAction::Pause, Selection::Ids(ids))
    }

    /// Resume paused downloads by id.
    pub fn resume(&self, ids: Vec<DownloadId>) -> Convertible<Vec<Download>> {
        self.bulk("resume", BulkAction::Resume, Selection::Ids(ids))
    }

    /// Cancel downloads by id.
    pub fn cancel(&self, ids: Vec<DownloadId>) -> Convertible<Vec<Download>> {
        self.bulk("cancel", BulkAction::Cancel, Selection::Ids(ids))
    }

    /// Stop managing downloads by id, keeping their files.
    pub fn remove(&self, ids: Vec<DownloadId>) -> Convertible<Vec<Download>> {
        self.bulk("remove", BulkAction::Remove, Selection::Ids(ids))
    }

    /// Stop managing downloads by id and delete their files.
    pub fn delete(&self, ids: Vec<DownloadId>) -> Convertible<Vec<Download>> {
        self.bulk("delete", BulkAction::Delete, Selection::Ids(ids))
    }

    /// Re-queue failed or cancelled downloads by id.
    pub fn retry(&self, ids: Vec<DownloadId>) -> Convertible<Vec<Download>> {
        self.bulk("retry", BulkAction::Retry, Selection::Ids(ids))
    }

    pub fn pause_group(&self, group: GroupId) -> Convertible<Vec<Download>> {
        self.bulk("pause_group", BulkAction::Pause, Selection::Group(group))
    }

    pub fn resume_group(&self, group: GroupId) -> Convertible<Vec<Download>> {
        self.bulk("resume_group", BulkAction::Resume, Selection::Group(group))
    }

    pub fn cancel_group(&self, group: GroupId) -> Convertible<Vec<Download>> {
        self.bulk("cancel_group", BulkAction::Cancel, Selection::Group(group))
    }

    pub fn remove_group(&self, group: GroupId) -> Convertible<Vec<Download>> {
        self.bulk("remove_group", BulkAction::Remove, Selection::Group(group))
    }

    pub fn delete_group(&self, group: GroupId) -> Convertible<Vec<Download>> {
        self.bulk("delete_group", BulkAction::Delete, Selection::Group(group))
    }

    pub fn cancel_all(&self) -> Convertible<Vec<Download>> {
        self.bulk("cancel_all", BulkAction::Cancel, Selection::All)
    }

    pub fn remove_all(&self) -> Convertible<Vec<Download>> {
        self.bulk("remove_all", BulkAction::Remove, Selection::All)
    }

    pub fn delete_all(&self) -> Convertible<Vec<Download>> {
        self.bulk("delete_all", BulkAction::Delete, Selection::All)
    }
}
