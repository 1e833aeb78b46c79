//! Upload policy: accepted image types, per-mode file counts and the size ceiling.

use crate::models::{AnalysisMode, CandidateFile};

/// Declared MIME types accepted for upload.
pub const ALLOWED_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/tiff",
    "image/tif",
];

/// Maximum raw size of one file (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Fewest files accepted in multi mode.
pub const MULTI_MIN_FILES: usize = 3;

/// Most files accepted in multi mode.
pub const MULTI_MAX_FILES: usize = 10;

/// Why a batch was refused before anything was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("Please upload PNG, JPG, or TIFF images only")]
    UnsupportedType,

    #[error("Please upload only one image for single image detection")]
    SingleImageOnly,

    #[error("Please upload 3-10 images for multi-image tracking")]
    MultiImageRange,

    #[error("File(s) too large. Maximum size is 10MB per file. Please compress your images.")]
    TooLarge { files: Vec<String> },
}

impl UploadRejection {
    /// Stable error code for the JSON API.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "UNSUPPORTED_TYPE",
            Self::SingleImageOnly => "SINGLE_IMAGE_ONLY",
            Self::MultiImageRange => "MULTI_IMAGE_RANGE",
            Self::TooLarge { .. } => "FILE_TOO_LARGE",
        }
    }
}

/// Whether a declared MIME type is accepted.
pub fn is_allowed_type(content_type: &str) -> bool {
    ALLOWED_TYPES.contains(&content_type)
}

/// Filter a selection down to allowed types and check the mode's file count.
///
/// Returns the accepted files in selection order. Files of other types are
/// dropped silently as long as at least one allowed file remains.
pub fn validate_selection(
    files: Vec<CandidateFile>,
    mode: AnalysisMode,
) -> Result<Vec<CandidateFile>, UploadRejection> {
    let retained: Vec<CandidateFile> = files
        .into_iter()
        .filter(|file| is_allowed_type(&file.content_type))
        .collect();

    if retained.is_empty() {
        return Err(UploadRejection::UnsupportedType);
    }

    match mode {
        AnalysisMode::Single if retained.len() > 1 => Err(UploadRejection::SingleImageOnly),
        AnalysisMode::Multi
            if !(MULTI_MIN_FILES..=MULTI_MAX_FILES).contains(&retained.len()) =>
        {
            Err(UploadRejection::MultiImageRange)
        }
        _ => Ok(retained),
    }
}

/// Check every file against the size ceiling; one oversized file fails the batch.
pub fn check_sizes(files: &[CandidateFile]) -> Result<(), UploadRejection> {
    let oversized: Vec<String> = files
        .iter()
        .filter(|file| file.size > MAX_FILE_SIZE)
        .map(|file| file.name.clone())
        .collect();

    if oversized.is_empty() {
        Ok(())
    } else {
        Err(UploadRejection::TooLarge { files: oversized })
    }
}
