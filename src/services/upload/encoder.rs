//! Data URL encoding of uploaded images.
//!
//! Stored records carry the image inline as `data:<mime>;base64,<payload>`,
//! the same self-describing form a browser produces for a local file.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::models::CandidateFile;

/// Encoding errors.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to convert file to base64")]
    Worker(#[from] tokio::task::JoinError),
}

/// A file together with its data URL.
#[derive(Debug)]
pub struct EncodedFile {
    pub file: CandidateFile,
    pub data_url: String,
}

/// Encode raw bytes as a base64 data URL.
pub fn encode_data_url(content_type: &str, data: &[u8]) -> String {
    let payload = STANDARD.encode(data);
    let mut url = String::with_capacity(content_type.len() + payload.len() + 13);
    url.push_str("data:");
    url.push_str(content_type);
    url.push_str(";base64,");
    url.push_str(&payload);
    url
}

/// Encode a file off the async workers; the file is handed back with its data URL.
pub async fn encode(file: CandidateFile) -> Result<EncodedFile, EncodeError> {
    let encoded = tokio::task::spawn_blocking(move || {
        let data_url = encode_data_url(&file.content_type, &file.data);
        EncodedFile { file, data_url }
    })
    .await?;
    Ok(encoded)
}
