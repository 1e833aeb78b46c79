//! Domain models for the TCC Predictor server.

pub mod session;
pub mod upload;
pub mod ws_event;

// Re-export commonly used types
pub use session::{Identity, ProviderTokens, SessionClaims, SessionId};
pub use upload::{AnalysisMode, CandidateFile, RecordKey, UploadRecord, UploadStatus};
pub use ws_event::{WsEvent, WsEventMessage};
