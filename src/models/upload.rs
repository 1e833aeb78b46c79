//! Upload models: candidate files, analysis modes and stored records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Analysis mode declared for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Exactly one image, detection use case.
    #[default]
    Single,
    /// A sequence of 3 to 10 images, tracking use case.
    Multi,
}

impl AnalysisMode {
    /// Parse mode from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Some(Self::Single),
            "multi" => Some(Self::Multi),
            _ => None,
        }
    }

    /// Get mode name as stored in `analysisType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }

    /// Tab title on the tools page.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Single => "Single Image Detection",
            Self::Multi => "Multi-Image Tracking",
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record status. Only `uploaded` exists until analysis is wired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploaded,
}

/// One file of a batch as received from the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    /// MIME type declared by the browser, parameters stripped.
    pub content_type: String,
    /// Raw byte size as received.
    pub size: u64,
    /// File contents. Left empty for files that can never be stored
    /// (unsupported type, oversized) so they are not buffered.
    pub data: Vec<u8>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: data.len() as u64,
            data,
        }
    }
}

/// Server-assigned, monotonically ordered key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(pub String);

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record appended under `tcc-uploads/{userId}`, one per stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub user_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    /// `data:<mime>;base64,<payload>`
    pub image_data: String,
    /// RFC 3339, UTC, millisecond precision
    pub upload_date: String,
    pub analysis_type: AnalysisMode,
    pub status: UploadStatus,
}

impl UploadRecord {
    pub fn new(
        owner_uid: &str,
        file: &CandidateFile,
        image_data: String,
        mode: AnalysisMode,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: owner_uid.to_string(),
            file_name: file.name.clone(),
            file_size: file.size,
            file_type: file.content_type.clone(),
            image_data,
            upload_date: uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            analysis_type: mode,
            status: UploadStatus::Uploaded,
        }
    }
}
