//! Batch submission: encode every accepted file and append one record per file.
//!
//! Files are processed concurrently. The batch succeeds only if every write
//! succeeds; records already written for sibling files are left in place when
//! another file fails.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use secrecy::SecretString;
use serde::Serialize;
use tracing::{info, warn};

use super::encoder;
use super::state::capped_progress;
use super::validator::{UploadRejection, check_sizes};
use crate::models::{AnalysisMode, CandidateFile, Identity, RecordKey, UploadRecord};
use crate::services::store::RecordStore;

/// Upload flow errors.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(#[from] UploadRejection),

    #[error("Please sign in to upload images")]
    NotSignedIn,

    #[error("An upload is already in progress")]
    InProgress,

    /// First failure of a batch, in completion order.
    #[error("Failed to upload {file_name}: {cause}")]
    File { file_name: String, cause: String },
}

/// A record written for one file.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub file_name: String,
    pub key: RecordKey,
}

/// Write one record per file under the owner's collection.
///
/// The size ceiling is checked for the whole batch before any write.
/// `on_progress` receives the capped encode progress and finally 100.
pub async fn submit_batch<F>(
    store: &dyn RecordStore,
    owner: &Identity,
    id_token: &SecretString,
    files: Vec<CandidateFile>,
    mode: AnalysisMode,
    on_progress: F,
) -> Result<Vec<StoredFile>, UploadError>
where
    F: Fn(f64) + Sync,
{
    check_sizes(&files)?;

    let total = files.len();
    let encoded = AtomicUsize::new(0);
    let encoded = &encoded;
    let on_progress = &on_progress;

    let mut tasks: FuturesUnordered<_> = files
        .into_iter()
        .map(|file| async move {
            let file_name = file.name.clone();
            let failed = |cause: String| UploadError::File {
                file_name: file_name.clone(),
                cause,
            };

            let encoded_file = encoder::encode(file)
                .await
                .map_err(|e| failed(e.to_string()))?;
            let done = encoded.fetch_add(1, Ordering::SeqCst) + 1;
            on_progress(capped_progress(done, total));

            let record = UploadRecord::new(
                &owner.uid,
                &encoded_file.file,
                encoded_file.data_url,
                mode,
                Utc::now(),
            );
            let key = store
                .append(&owner.uid, id_token, &record)
                .await
                .map_err(|e| failed(e.to_string()))?;

            Ok::<_, UploadError>(StoredFile {
                file_name: file_name.clone(),
                key,
            })
        })
        .collect();

    let mut stored = Vec::with_capacity(total);
    let mut first_error = None;

    // Every task runs to completion, even after one has failed.
    while let Some(result) = tasks.next().await {
        match result {
            Ok(file) => stored.push(file),
            Err(e) => {
                warn!(uid = %owner.uid, error = %e, "Record write failed");
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(e) = first_error {
        if !stored.is_empty() {
            warn!(
                uid = %owner.uid,
                written = stored.len(),
                total,
                "Batch failed after some records were written"
            );
        }
        return Err(e);
    }

    on_progress(100.0);
    info!(uid = %owner.uid, files = total, mode = %mode, "Batch stored");
    Ok(stored)
}
