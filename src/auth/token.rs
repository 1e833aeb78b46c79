//! Signed session cookie tokens (HS256 JWT).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};

use crate::models::{SessionClaims, SessionId};

/// Session JWT issuer.
pub const SESSION_ISSUER: &str = "tcc-predictor";

/// Sign a session cookie value for `session_id`.
pub fn create_session_token(
    session_id: &SessionId,
    secret: &SecretString,
    ttl_secs: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::seconds(ttl_secs as i64);

    let claims = SessionClaims {
        sub: session_id.as_str().to_string(),
        iss: SESSION_ISSUER.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    encode(&Header::default(), &claims, &key)
}

/// Verify a session cookie value and return the session id it carries.
pub fn verify_session_token(token: &str, secret: &SecretString) -> Result<SessionId, String> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_aud = false;

    let token_data = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| format!("Invalid session token: {}", e))?;

    Ok(SessionId::from(token_data.claims.sub))
}
