//! Scripted in-memory engine.
//!
//! Answers every call from an in-memory table. Callbacks fire inline by
//! default; in deferred mode they queue up until [`ScriptedEngine::flush`]
//! (or [`ScriptedEngine::flush_on_thread`]) runs them, which lets tests
//! subscribe before resolution.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use rxfetch_core::{
    BulkAction, Callback, Download, DownloadId, DownloadQuery, EnqueueOutcome, FailureCallback,
    FetchEnginePort, FetchError, RejectReason, Request, RequestInfo, Selection, Status,
};
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct EngineState {
    downloads: BTreeMap<DownloadId, Download>,
    rejections: HashMap<String, RejectReason>,
    fail_next: Option<FetchError>,
    deferred: bool,
    pending: Vec<Job>,
    calls: usize,
    closed: bool,
}

/// In-memory engine with scriptable failures and delivery timing.
pub struct ScriptedEngine {
    namespace: String,
    state: Mutex<EngineState>,
}

impl ScriptedEngine {
    /// Create an engine whose downloads carry `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Create a shared engine.
    pub fn shared(namespace: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(namespace))
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hold callbacks until flushed.
    pub fn set_deferred(&self, deferred: bool) {
        self.lock().deferred = deferred;
    }

    /// Reject future enqueues of `url` with `reason`.
    pub fn reject_url(&self, url: impl Into<String>, reason: RejectReason) {
        self.lock().rejections.insert(url.into(), reason);
    }

    /// Fail the next call with `error`, whatever it is.
    pub fn fail_next(&self, error: FetchError) {
        self.lock().fail_next = Some(error);
    }

    /// Seed a download directly.
    pub fn insert(&self, download: Download) {
        self.lock().downloads.insert(download.id, download);
    }

    /// Snapshot of every stored download.
    pub fn downloads(&self) -> Vec<Download> {
        self.lock().downloads.values().cloned().collect()
    }

    /// Number of engine calls received (excluding `close`).
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Number of callbacks waiting for a flush.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Run every held callback on the current thread.
    pub fn flush(&self) -> usize {
        let jobs = std::mem::take(&mut self.lock().pending);
        let count = jobs.len();
        for job in jobs {
            job();
        }
        count
    }

    /// Run every held callback on a fresh thread, like a real engine would.
    pub fn flush_on_thread(&self) -> JoinHandle<usize> {
        let jobs = std::mem::take(&mut self.lock().pending);
        thread::spawn(move || {
            let count = jobs.len();
            for job in jobs {
                job();
            }
            count
        })
    }

    /// Compute a result under the lock, then deliver it inline or defer it.
    fn respond<T, F>(&self, compute: F, on_success: Callback<T>, on_failure: FailureCallback)
    where
        T: Send + 'static,
        F: FnOnce(&mut EngineState) -> Result<T, FetchError>,
    {
        let (outcome, deferred) = {
            let mut state = self.lock();
            state.calls += 1;
            let outcome = match state.fail_next.take() {
                Some(error) => Err(error),
                None => compute(&mut *state),
            };
            (outcome, state.deferred)
        };

        let job: Job = Box::new(move || match outcome {
            Ok(value) => on_success(value),
            Err(error) => on_failure(error),
        });

        if deferred {
            self.lock().pending.push(job);
        } else {
            job();
        }
    }

    fn add(&self, state: &mut EngineState, request: &Request) -> Result<Download, FetchError> {
        if request.url.is_empty() {
            return Err(FetchError::rejected(
                RejectReason::InvalidRequest,
                "request url is empty",
            ));
        }
        if let Some(reason) = state.rejections.get(&request.url) {
            return Err(FetchError::rejected(*reason, request.url.clone()));
        }
        if state.downloads.contains_key(&request.id()) {
            return Err(FetchError::rejected(
                RejectReason::RequestAlreadyExists,
                format!("{} -> {}", request.url, request.file),
            ));
        }

        let download = Download::from_request(request, self.namespace.clone());
        state.downloads.insert(download.id, download.clone());
        Ok(download)
    }
}

impl FetchEnginePort for ScriptedEngine {
    fn enqueue(&self, request: Request, on_success: Callback<Download>, on_failure: FailureCallback) {
        self.respond(|state| self.add(state, &request), on_success, on_failure);
    }

    fn enqueue_all(
        &self,
        requests: Vec<Request>,
        on_success: Callback<Vec<EnqueueOutcome>>,
        on_failure: FailureCallback,
    ) {
        self.respond(
            |state| {
                Ok(requests
                    .into_iter()
                    .map(|request| match self.add(state, &request) {
                        Ok(download) => EnqueueOutcome::accepted(request, download),
                        Err(error) => EnqueueOutcome::refused(request, error),
                    })
                    .collect())
            },
            on_success,
            on_failure,
        );
    }

    fn query(
        &self,
        query: DownloadQuery,
        on_success: Callback<Vec<Download>>,
        on_failure: FailureCallback,
    ) {
        self.respond(
            |state| {
                Ok(state
                    .downloads
                    .values()
                    .filter(|download| query.matches(download))
                    .cloned()
                    .collect())
            },
            on_success,
            on_failure,
        );
    }

    fn get_download(
        &self,
        id: DownloadId,
        on_success: Callback<Option<Download>>,
        on_failure: FailureCallback,
    ) {
        self.respond(
            |state| Ok(state.downloads.get(&id).cloned()),
            on_success,
            on_failure,
        );
    }

    fn update_request(
        &self,
        id: DownloadId,
        info: RequestInfo,
        _notify_listeners: bool,
        on_success: Callback<Download>,
        on_failure: FailureCallback,
    ) {
        self.respond(
            |state| {
                let download = state
                    .downloads
                    .get_mut(&id)
                    .ok_or_else(|| FetchError::not_found(format!("download {id}")))?;
                download.apply(&info);
                Ok(download.clone())
            },
            on_success,
            on_failure,
        );
    }

    fn apply(
        &self,
        action: BulkAction,
        selection: Selection,
        on_success: Callback<Vec<Download>>,
        on_failure: FailureCallback,
    ) {
        self.respond(
            |state| {
                let status = action.resulting_status();
                let ids: Vec<DownloadId> = state
                    .downloads
                    .values()
                    .filter(|download| selection.contains(download))
                    .map(|download| download.id)
                    .collect();

                let mut affected = Vec::with_capacity(ids.len());
                for id in ids {
                    if matches!(action, BulkAction::Remove | BulkAction::Delete) {
                        if let Some(mut download) = state.downloads.remove(&id) {
                            download.status = status;
                            affected.push(download);
                        }
                    } else if let Some(download) = state.downloads.get_mut(&id) {
                        download.status = status;
                        if action == BulkAction::Retry {
                            download.error = None;
                        }
                        affected.push(download.clone());
                    }
                }
                Ok(affected)
            },
            on_success,
            on_failure,
        );
    }

    fn has_active_downloads(
        &self,
        include_added: bool,
        on_success: Callback<bool>,
        on_failure: FailureCallback,
    ) {
        self.respond(
            |state| {
                Ok(state.downloads.values().any(|download| {
                    download.status.is_active() || (include_added && download.status == Status::Added)
                }))
            },
            on_success,
            on_failure,
        );
    }

    fn close(&self) {
        self.lock().closed = true;
        debug!(namespace = %self.namespace, "Scripted engine closed");
    }
}
