//! Firebase Realtime Database over its REST API.
//!
//! `POST {database_url}/tcc-uploads/{uid}.json?auth={id_token}` appends a
//! child with a push key and answers `{"name": "<push key>"}`.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{RecordStore, StoreError, collection_path};
use crate::config::FirebaseSettings;
use crate::models::{RecordKey, UploadRecord};

const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// Records carry up to ~13.4 MB of base64 each; allow slow uplinks.
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// Realtime database client.
#[derive(Clone)]
pub struct FirebaseRecordStore {
    client: reqwest::Client,
    database_url: String,
}

impl FirebaseRecordStore {
    pub fn new(settings: &FirebaseSettings) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            database_url: settings.database_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Deserialize)]
struct DatabaseError {
    error: String,
}

#[async_trait]
impl RecordStore for FirebaseRecordStore {
    async fn append(
        &self,
        owner_uid: &str,
        id_token: &SecretString,
        record: &UploadRecord,
    ) -> Result<RecordKey, StoreError> {
        let url = format!("{}/{}.json", self.database_url, collection_path(owner_uid));

        let response = self
            .client
            .post(&url)
            .query(&[("auth", id_token.expose_secret())])
            .json(record)
            .send()
            .await
            .map_err(|e| {
                warn!(file = %record.file_name, error = %e, "Record write request failed");
                StoreError::Network(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            let pushed: PushResponse = response
                .json()
                .await
                .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
            debug!(file = %record.file_name, key = %pushed.name, "Record appended");
            return Ok(RecordKey(pushed.name));
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from(status, &body))
    }

    fn backend(&self) -> &'static str {
        "firebase"
    }
}

fn error_from(status: StatusCode, body: &str) -> StoreError {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return StoreError::PermissionDenied;
    }
    match serde_json::from_str::<DatabaseError>(body) {
        Ok(err) => StoreError::Rejected(err.error),
        Err(_) => StoreError::InvalidResponse(format!("status {}", status)),
    }
}
