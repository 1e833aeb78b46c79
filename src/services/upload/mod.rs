//! Image upload flow.
//!
//! A selection is validated (type filter, per-mode count), becomes the active
//! batch, passes the size check and is then encoded and appended to the record
//! store one record per file.
//!
//! - `POST /tools/upload` — HTML form; answers `303` back to the tools page
//! - `POST /tools/dismiss` — dismiss the inline upload error
//! - `POST /api/v1/uploads` — same flow, JSON response
//! - `GET /api/v1/uploads/state` — upload state of the caller's browser

pub mod encoder;
pub mod state;
mod submitter;
pub mod validator;

pub use state::{UploadBoard, UploadPhase, UploadState};
pub use submitter::{StoredFile, UploadError, submit_batch};
pub use validator::{UploadRejection, check_sizes, validate_selection};

use actix_multipart::{Field, Multipart};
use actix_web::{HttpResponse, get, post, web};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::auth::{AuthProvider, BrowserSession};
use crate::error::{AppError, AppResult};
use crate::models::{AnalysisMode, CandidateFile, SessionId};
use crate::services::session::SessionRegistry;
use crate::services::store::RecordStore;
use validator::{MAX_FILE_SIZE, MULTI_MAX_FILES, is_allowed_type};

/// Longest accepted value of a text field in the upload form.
const MAX_TEXT_FIELD: usize = 64;

// ============================================================================
// Route Configuration
// ============================================================================

/// Routes served at the site root.
pub fn configure_page_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_form).service(dismiss_error);
}

/// Routes served under `/api/v1`.
pub fn configure_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_json).service(upload_state);
}

// ============================================================================
// Flow
// ============================================================================

/// Run one selection through validation, submission and the upload state.
///
/// Identity is checked first; without one nothing else happens.
pub async fn run_upload(
    session: &SessionId,
    mode: AnalysisMode,
    files: Vec<CandidateFile>,
    registry: &SessionRegistry,
    provider: &dyn AuthProvider,
    store: &dyn RecordStore,
    board: &UploadBoard,
) -> Result<Vec<StoredFile>, UploadError> {
    let (identity, id_token) = registry
        .credentials(session, provider)
        .await
        .ok_or(UploadError::NotSignedIn)?;

    let accepted = validate_selection(files, mode).inspect_err(|rejection| {
        info!(session = %session, reason = %rejection, "Selection rejected");
        board.reject(session, rejection);
    })?;

    let names = accepted.iter().map(|file| file.name.clone()).collect();
    let ticket = board.begin(session, mode, names)?;

    let result = submit_batch(store, &identity, &id_token, accepted, mode, |progress| {
        board.progress(session, ticket, progress)
    })
    .await;

    match &result {
        Ok(_) => board.succeed(session, ticket),
        Err(e) => board.fail(session, ticket, &e.to_string()),
    }
    result
}

/// Parsed upload form.
struct UploadForm {
    mode: Option<AnalysisMode>,
    files: Vec<CandidateFile>,
}

/// Read the `mode` and `files` fields of an upload form.
///
/// Contents are buffered only for files that can still be stored: allowed
/// type, within the size ceiling, and no more than the largest accepted batch.
/// Other files keep their name, type and size for validation.
async fn read_upload_form(payload: &mut Multipart) -> AppResult<UploadForm> {
    let mut mode = None;
    let mut files = Vec::new();
    let mut retained = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item?;

        match field.name() {
            Some("mode") => {
                let raw = read_text_field(&mut field).await?;
                mode = Some(AnalysisMode::parse(&raw).ok_or_else(|| {
                    AppError::InvalidInput(format!("Unknown analysis mode '{}'", raw))
                })?);
            }
            Some("files") => {
                let name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or_default()
                    .to_string();

                // Browsers send one empty part when nothing was selected.
                if name.is_empty() {
                    drain_field(&mut field).await;
                    continue;
                }

                let content_type = field
                    .content_type()
                    .map(|mime| mime.essence_str().to_string())
                    .unwrap_or_default();

                let allowed = is_allowed_type(&content_type);
                if allowed {
                    retained += 1;
                }
                let buffer = allowed && retained <= MULTI_MAX_FILES;
                files.push(read_file_field(&mut field, name, content_type, buffer).await?);
            }
            _ => drain_field(&mut field).await,
        }
    }

    Ok(UploadForm { mode, files })
}

async fn read_file_field(
    field: &mut Field,
    name: String,
    content_type: String,
    mut buffer: bool,
) -> AppResult<CandidateFile> {
    let mut data = Vec::new();
    let mut size: u64 = 0;

    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        size += chunk.len() as u64;
        if buffer && size > MAX_FILE_SIZE {
            // Rejected by the size check later; stop holding it.
            buffer = false;
            data = Vec::new();
        }
        if buffer {
            data.extend_from_slice(&chunk);
        }
    }

    Ok(CandidateFile {
        name,
        content_type,
        size,
        data,
    })
}

async fn read_text_field(field: &mut Field) -> AppResult<String> {
    let mut raw = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if raw.len() + chunk.len() > MAX_TEXT_FIELD {
            return Err(AppError::InvalidInput("Form field too long".to_string()));
        }
        raw.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&raw).trim().to_string())
}

/// Drain a multipart field without saving.
async fn drain_field(field: &mut Field) {
    while let Some(chunk) = field.next().await {
        let _ = chunk;
    }
}

fn acquire_permit(semaphore: &Semaphore) -> AppResult<tokio::sync::SemaphorePermit<'_>> {
    semaphore.try_acquire().map_err(|_| {
        warn!("Upload rejected: too many concurrent uploads");
        AppError::ServiceUnavailable(
            "Too many concurrent uploads. Please try again later.".to_string(),
        )
    })
}

fn tools_location(mode: AnalysisMode) -> String {
    format!("/tools?mode={}", mode)
}

// ============================================================================
// Handlers
// ============================================================================

/// Upload form submission.
///
/// POST /tools/upload
/// Content-Type: multipart/form-data
#[post("/tools/upload")]
#[allow(clippy::too_many_arguments)]
async fn upload_form(
    session: BrowserSession,
    mut payload: Multipart,
    registry: web::Data<SessionRegistry>,
    provider: web::Data<dyn AuthProvider>,
    store: web::Data<dyn RecordStore>,
    board: web::Data<UploadBoard>,
    upload_semaphore: web::Data<Semaphore>,
) -> AppResult<HttpResponse> {
    if registry.current(&session.id).is_none() {
        return Ok(session.redirect("/login"));
    }

    let _permit = acquire_permit(&upload_semaphore)?;
    let form = read_upload_form(&mut payload).await?;
    let mode = form
        .mode
        .unwrap_or_else(|| board.snapshot(&session.id).mode);

    if form.files.is_empty() {
        return Ok(session.redirect(&tools_location(mode)));
    }

    match run_upload(
        &session.id,
        mode,
        form.files,
        &registry,
        provider.get_ref(),
        store.get_ref(),
        &board,
    )
    .await
    {
        Err(UploadError::NotSignedIn) => Ok(session.redirect("/login")),
        // Outcome is on the board; the tools page renders it.
        _ => Ok(session.redirect(&tools_location(mode))),
    }
}

/// Dismiss the inline upload error.
#[post("/tools/dismiss")]
async fn dismiss_error(session: BrowserSession, board: web::Data<UploadBoard>) -> HttpResponse {
    board.dismiss(&session.id);
    let mode = board.snapshot(&session.id).mode;
    session.redirect(&tools_location(mode))
}

/// JSON upload response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub mode: AnalysisMode,
    pub files: Vec<UploadedFile>,
    pub progress: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_name: String,
    pub key: String,
}

/// Upload images and answer with the stored record keys.
///
/// POST /api/v1/uploads
/// Content-Type: multipart/form-data
#[post("/uploads")]
#[allow(clippy::too_many_arguments)]
async fn upload_json(
    session: BrowserSession,
    mut payload: Multipart,
    registry: web::Data<SessionRegistry>,
    provider: web::Data<dyn AuthProvider>,
    store: web::Data<dyn RecordStore>,
    board: web::Data<UploadBoard>,
    upload_semaphore: web::Data<Semaphore>,
) -> AppResult<HttpResponse> {
    if registry.current(&session.id).is_none() {
        return Err(UploadError::NotSignedIn.into());
    }

    let _permit = acquire_permit(&upload_semaphore)?;
    let form = read_upload_form(&mut payload).await?;
    let mode = form.mode.unwrap_or_default();

    if form.files.is_empty() {
        return Err(AppError::InvalidInput("No files provided".to_string()));
    }

    let stored = run_upload(
        &session.id,
        mode,
        form.files,
        &registry,
        provider.get_ref(),
        store.get_ref(),
        &board,
    )
    .await?;

    Ok(session.apply(&mut HttpResponse::Created()).json(UploadResponse {
        mode,
        files: stored
            .into_iter()
            .map(|file| UploadedFile {
                file_name: file.file_name,
                key: file.key.0,
            })
            .collect(),
        progress: 100.0,
    }))
}

/// Upload state of the caller's browser.
///
/// GET /api/v1/uploads/state
#[get("/uploads/state")]
async fn upload_state(session: BrowserSession, board: web::Data<UploadBoard>) -> HttpResponse {
    session
        .apply(&mut HttpResponse::Ok())
        .json(board.snapshot(&session.id))
}
