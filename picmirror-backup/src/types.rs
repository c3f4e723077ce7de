use chrono::{DateTime, Utc};
use picmirror::{DestinationId, FailureKind, FileRecord, MirrorError, ResultItem};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Self-contained copy of one file's payload, taken before the primary upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub file_name: String,
    pub extname: Option<String>,
    pub binary_payload: Option<Vec<u8>>,
    pub encoded_payload: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl CachedFile {
    /// Deep-copy the payload fields of an in-flight record. Any URL the
    /// record may already carry is not part of the cached state.
    pub fn capture(record: &FileRecord) -> Self {
        CachedFile {
            file_name: record.file_name.clone(),
            extname: record.extname.clone(),
            binary_payload: record.buffer.as_ref().map(|b| b.to_vec()),
            encoded_payload: record.base64_image.clone(),
            width: record.width,
            height: record.height,
        }
    }

    /// Fresh record for an uploader, named `file_name`, with no URL set.
    pub fn to_record(&self, file_name: &str) -> FileRecord {
        FileRecord {
            file_name: file_name.to_string(),
            extname: self.extname.clone(),
            buffer: self.binary_payload.clone(),
            base64_image: self.encoded_payload.clone(),
            img_url: None,
            url: None,
            width: self.width,
            height: self.height,
        }
    }

    pub fn has_payload(&self) -> bool {
        self.binary_payload.is_some() || self.encoded_payload.is_some()
    }

    /// Payload size description for logs, e.g. `buffer=1024B base64=1368c`.
    pub fn describe_payload(&self) -> String {
        let buffer = match self.binary_payload {
            Some(ref b) => format!("{}B", b.len()),
            None => "missing".to_string(),
        };
        let encoded = match self.encoded_payload {
            Some(ref e) => format!("{}c", e.len()),
            None => "missing".to_string(),
        };
        format!("buffer={} base64={}", buffer, encoded)
    }
}

/// Result of backing up one cycle's files to one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupOutcome {
    pub destination_id: DestinationId,
    pub succeeded: bool,
    pub result_items: Vec<ResultItem>,
    pub error_message: Option<String>,
    pub failure: Option<FailureKind>,
    pub elapsed_ms: u64,
}

impl BackupOutcome {
    pub fn success(destination_id: &str, result_items: Vec<ResultItem>, elapsed_ms: u64) -> Self {
        BackupOutcome {
            destination_id: destination_id.to_string(),
            succeeded: true,
            result_items,
            error_message: None,
            failure: None,
            elapsed_ms,
        }
    }

    pub fn failure(destination_id: &str, error: &MirrorError, elapsed_ms: u64) -> Self {
        BackupOutcome {
            destination_id: destination_id.to_string(),
            succeeded: false,
            result_items: Vec::new(),
            error_message: Some(error.to_string()),
            failure: Some(error.kind()),
            elapsed_ms,
        }
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.result_items
            .iter()
            .filter_map(|item| item.resolved_url.as_deref())
    }
}

/// Orchestrator lifecycle stage for the current upload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    Capturing,
    AwaitingPrimary,
    FanningOut,
    Aggregating,
}

/// Why a post-upload run ended without fanning out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoDestinations,
    CacheMissing,
    PrimaryFailed,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoDestinations => "no backup destinations configured",
            SkipReason::CacheMissing => "cached image data is missing",
            SkipReason::PrimaryFailed => "primary upload produced no URL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub skipped: Option<SkipReason>,
    pub outcomes: Vec<BackupOutcome>,
}

impl CycleReport {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn summary(&self) -> String {
        format!("{}/{} succeeded", self.success_count(), self.total())
    }

    pub fn outcome(&self, destination_id: &str) -> Option<&BackupOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.destination_id == destination_id)
    }
}
