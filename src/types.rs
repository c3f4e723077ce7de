use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Destination (uploader) identifier, e.g. `"github"` or `"smms"`.
pub type DestinationId = String;

/// One in-flight file as the host upload pipeline sees it.
///
/// Before upload only the payload fields are populated. A successful upload
/// fills in `img_url` (and sometimes `url`). Uploaders read and write these
/// records through [`crate::UploadContext::output`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extname: Option<String>,
    #[serde(skip)]
    pub buffer: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl FileRecord {
    pub fn new(file_name: impl Into<String>) -> Self {
        FileRecord {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    pub fn with_buffer(mut self, buffer: impl Into<Vec<u8>>) -> Self {
        self.buffer = Some(buffer.into());
        self
    }

    pub fn with_base64(mut self, encoded: impl Into<String>) -> Self {
        self.base64_image = Some(encoded.into());
        self
    }

    pub fn with_img_url(mut self, url: impl Into<String>) -> Self {
        self.img_url = Some(url.into());
        self
    }

    /// The URL this record resolved to, preferring `img_url` over `url`.
    /// Empty strings count as unresolved.
    pub fn resolved_url(&self) -> Option<&str> {
        self.img_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.url.as_deref().filter(|u| !u.is_empty()))
    }

    /// Raw image bytes: the binary buffer if present, otherwise the decoded
    /// base64 form. `None` when neither is present or the base64 is invalid.
    pub fn payload_bytes(&self) -> Option<Cow<'_, [u8]>> {
        if let Some(ref buf) = self.buffer {
            return Some(Cow::Borrowed(buf.as_slice()));
        }
        let encoded = self.base64_image.as_deref()?;
        // Accept data URLs as well as bare base64.
        let encoded = match encoded.split_once(";base64,") {
            Some((_, data)) => data,
            None => encoded,
        };
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .ok()
            .map(Cow::Owned)
    }
}

/// What the primary upload produced for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryResult {
    pub file_name: String,
    pub resolved_url: Option<String>,
}

impl PrimaryResult {
    pub fn from_record(record: &FileRecord) -> Self {
        PrimaryResult {
            file_name: record.file_name.clone(),
            resolved_url: record.resolved_url().map(str::to_string),
        }
    }

    /// Collect primary results from the host's final output, preserving order.
    pub fn collect(records: &[FileRecord]) -> Vec<Self> {
        records.iter().map(Self::from_record).collect()
    }
}

/// One file as reported back by a backup destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub file_name: String,
    pub resolved_url: Option<String>,
}

impl From<&FileRecord> for ResultItem {
    fn from(record: &FileRecord) -> Self {
        ResultItem {
            file_name: record.file_name.clone(),
            resolved_url: record.resolved_url().map(str::to_string),
        }
    }
}
