//! Core domain types for downloads.
//!
//! Pure data types with no I/O dependencies.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::FetchError;

/// Engine-assigned download identifier.
pub type DownloadId = i32;

/// Identifier of a download group.
pub type GroupId = i32;

/// Lifecycle state of a download as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    None,
    Queued,
    Downloading,
    Paused,
    Completed,
    Cancelled,
    Failed,
    Removed,
    Deleted,
    Added,
}

impl Status {
    /// Check if the engine is done with this download.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Failed | Self::Removed | Self::Deleted
        )
    }

    /// Check if the download is queued or transferring.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Queued | Self::Downloading)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Removed => "removed",
            Self::Deleted => "deleted",
            Self::Added => "added",
        };
        f.write_str(s)
    }
}

/// Scheduling priority hint for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// Network constraint for a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NetworkType {
    /// Defer to the instance-wide setting.
    GlobalOff,
    #[default]
    All,
    WifiOnly,
    Unmetered,
}

/// Java-style 31-multiplier string hash. Stable across runs and platforms.
fn string_hash(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |acc, unit| acc.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Derive the download id for a URL/file pair.
#[must_use]
pub fn derive_download_id(url: &str, file: &str) -> DownloadId {
    string_hash(url).wrapping_mul(31).wrapping_add(string_hash(file))
}

/// A request to download `url` into `file`.
///
/// The engine may normalize the identity on enqueue; the returned
/// [`Download`] is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Remote URL.
    pub url: String,
    /// Destination file path.
    pub file: String,
    /// Group this download belongs to (0 = ungrouped).
    pub group: GroupId,
    /// Scheduling priority.
    pub priority: Priority,
    /// Network constraint.
    pub network_type: NetworkType,
    /// Extra HTTP headers.
    pub headers: BTreeMap<String, String>,
    /// Optional caller tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Caller-defined identifier (0 = unset).
    pub identifier: i64,
}

impl Request {
    /// Create a new request with required fields.
    pub fn new(url: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file: file.into(),
            group: 0,
            priority: Priority::default(),
            network_type: NetworkType::default(),
            headers: BTreeMap::new(),
            tag: None,
            identifier: 0,
        }
    }

    /// Id derived from URL and file.
    #[must_use]
    pub fn id(&self) -> DownloadId {
        derive_download_id(&self.url, &self.file)
    }

    /// Set the group.
    #[must_use]
    pub const fn with_group(mut self, group: GroupId) -> Self {
        self.group = group;
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the network constraint.
    #[must_use]
    pub const fn with_network_type(mut self, network_type: NetworkType) -> Self {
        self.network_type = network_type;
        self
    }

    /// Add an HTTP header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the caller-defined identifier.
    #[must_use]
    pub const fn with_identifier(mut self, identifier: i64) -> Self {
        self.identifier = identifier;
        self
    }
}

/// Engine-owned record of a request's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub id: DownloadId,
    /// Namespace of the instance managing this download.
    pub namespace: String,
    pub url: String,
    pub file: String,
    pub group: GroupId,
    pub status: Status,
    pub priority: Priority,
    pub network_type: NetworkType,
    pub headers: BTreeMap<String, String>,
    /// Bytes written so far.
    pub downloaded: u64,
    /// Content length, when the server reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Failure recorded by the engine, for `Status::Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FetchError>,
    pub identifier: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub created: DateTime<Utc>,
}

impl Download {
    /// Build the initial record an engine stores for a freshly added request.
    pub fn from_request(request: &Request, namespace: impl Into<String>) -> Self {
        Self {
            id: request.id(),
            namespace: namespace.into(),
            url: request.url.clone(),
            file: request.file.clone(),
            group: request.group,
            status: Status::Queued,
            priority: request.priority,
            network_type: request.network_type,
            headers: request.headers.clone(),
            downloaded: 0,
            total: None,
            error: None,
            identifier: request.identifier,
            tag: request.tag.clone(),
            created: Utc::now(),
        }
    }

    /// Progress in percent, or `None` while the content length is unknown.
    #[must_use]
    pub fn progress(&self) -> Option<u8> {
        match self.total {
            Some(0) => Some(100),
            Some(total) => {
                let pct = self.downloaded.min(total).saturating_mul(100) / total;
                u8::try_from(pct).ok()
            }
            None => None,
        }
    }

    /// Rebuild the request this download was created from.
    #[must_use]
    pub fn request(&self) -> Request {
        Request {
            url: self.url.clone(),
            file: self.file.clone(),
            group: self.group,
            priority: self.priority,
            network_type: self.network_type,
            headers: self.headers.clone(),
            tag: self.tag.clone(),
            identifier: self.identifier,
        }
    }

    /// Apply a partial update.
    pub fn apply(&mut self, info: &RequestInfo) {
        if let Some(group) = info.group {
            self.group = group;
        }
        if let Some(priority) = info.priority {
            self.priority = priority;
        }
        if let Some(network_type) = info.network_type {
            self.network_type = network_type;
        }
        if let Some(ref headers) = info.headers {
            self.headers.clone_from(headers);
        }
        if let Some(ref tag) = info.tag {
            self.tag.clone_from(tag);
        }
    }
}

/// Partial update applied to an existing download by id.
///
/// `None` leaves a field untouched. For `tag`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestInfo {
    pub group: Option<GroupId>,
    pub headers: Option<BTreeMap<String, String>>,
    pub priority: Option<Priority>,
    pub network_type: Option<NetworkType>,
    pub tag: Option<Option<String>>,
}

impl RequestInfo {
    /// Check if this update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.group.is_none()
            && self.headers.is_none()
            && self.priority.is_none()
            && self.network_type.is_none()
            && self.tag.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_is_stable() {
        let a = Request::new("https://example.com/a.bin", "/tmp/a.bin");
        let b = Request::new("https://example.com/a.bin", "/tmp/a.bin").with_group(7);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), Request::new("https://example.com/a.bin", "/tmp/b.bin").id());
    }

    #[test]
    fn test_string_hash_matches_reference_values() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        assert_eq!(string_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_progress() {
        let mut download = Download::from_request(&Request::new("u", "f"), "ns");
        assert_eq!(download.progress(), None);

        download.total = Some(200);
        download.downloaded = 50;
        assert_eq!(download.progress(), Some(25));

        download.downloaded = 500;
        assert_eq!(download.progress(), Some(100));
    }

    #[test]
    fn test_apply_request_info() {
        let mut download = Download::from_request(&Request::new("u", "f").with_tag("old"), "ns");
        let info = RequestInfo {
            group: Some(3),
            priority: Some(Priority::High),
            tag: Some(None),
            ..Default::default()
        };
        download.apply(&info);

        assert_eq!(download.group, 3);
        assert_eq!(download.priority, Priority::High);
        assert_eq!(download.tag, None);
        assert_eq!(download.network_type, NetworkType::All);
    }

    #[test]
    fn test_request_round_trips_through_download() {
        let request = Request::new("u", "f")
            .with_header("Authorization", "Bearer x")
            .with_identifier(42);
        let download = Download::from_request(&request, "ns");
        assert_eq!(download.request(), request);
    }

    #[test]
    fn test_status_classification() {
        assert!(Status::Completed.is_terminal());
        assert!(!Status::Paused.is_terminal());
        assert!(Status::Downloading.is_active());
        assert!(!Status::Added.is_active());
    }
}
