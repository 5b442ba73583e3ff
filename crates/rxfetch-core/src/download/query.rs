//! Query and bulk-action descriptors passed to the engine.

use serde::{Deserialize, Serialize};

use super::errors::FetchError;
use super::types::{Download, DownloadId, GroupId, Request, Status};

/// Which downloads a list query should return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadQuery {
    All,
    Ids(Vec<DownloadId>),
    Group(GroupId),
    Status(Vec<Status>),
    GroupWithStatus(GroupId, Vec<Status>),
    RequestIdentifier(i64),
}

impl DownloadQuery {
    /// Check whether a download satisfies this query.
    ///
    /// Engines may use this for in-memory filtering.
    #[must_use]
    pub fn matches(&self, download: &Download) -> bool {
        match self {
            Self::All => true,
            Self::Ids(ids) => ids.contains(&download.id),
            Self::Group(group) => download.group == *group,
            Self::Status(statuses) => statuses.contains(&download.status),
            Self::GroupWithStatus(group, statuses) => {
                download.group == *group && statuses.contains(&download.status)
            }
            Self::RequestIdentifier(identifier) => download.identifier == *identifier,
        }
    }
}

/// State transition applied to a [`Selection`] of downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulkAction {
    Pause,
    Resume,
    Cancel,
    Remove,
    Delete,
    Retry,
}

impl BulkAction {
    /// Status a download ends up in after this action.
    #[must_use]
    pub const fn resulting_status(self) -> Status {
        match self {
            Self::Pause => Status::Paused,
            Self::Resume | Self::Retry => Status::Queued,
            Self::Cancel => Status::Cancelled,
            Self::Remove => Status::Removed,
            Self::Delete => Status::Deleted,
        }
    }
}

/// Target of a bulk action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    Ids(Vec<DownloadId>),
    Group(GroupId),
    All,
}

impl Selection {
    /// Check whether a download is part of this selection.
    #[must_use]
    pub fn contains(&self, download: &Download) -> bool {
        match self {
            Self::Ids(ids) => ids.contains(&download.id),
            Self::Group(group) => download.group == *group,
            Self::All => true,
        }
    }
}

/// Per-request result of a batch enqueue, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// The request as submitted.
    pub request: Request,
    /// The stored download, or why the engine refused it.
    pub result: Result<Download, FetchError>,
}

impl EnqueueOutcome {
    /// Outcome for an accepted request.
    #[must_use]
    pub const fn accepted(request: Request, download: Download) -> Self {
        Self {
            request,
            result: Ok(download),
        }
    }

    /// Outcome for a refused request.
    #[must_use]
    pub const fn refused(request: Request, error: FetchError) -> Self {
        Self {
            request,
            result: Err(error),
        }
    }
}
