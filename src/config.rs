//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

/// Browser session cookie name (HS256 JWT carrying the opaque session id).
pub const SESSION_COOKIE: &str = "tcc_session";

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_SESSION_SECRET: &str = "dev-session-secret-do-not-use-in-production";
    pub const DEV_SESSION_TTL_SECS: u64 = 7 * 24 * 3600; // 7 days
    pub const DEV_SESSION_IDLE_SECS: u64 = 24 * 3600; // prune anonymous/idle sessions after a day
    pub const DEV_SUCCESS_DISPLAY_MS: u64 = 2000;
    pub const DEV_MAX_CONCURRENT_UPLOADS: usize = 4;

    pub const FIREBASE_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
    pub const FIREBASE_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
    pub const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
    pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Browser session settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// HS256 secret used to sign the session cookie.
    pub secret: SecretString,
    /// Lifetime of the session cookie in seconds.
    pub ttl_secs: u64,
    /// Sessions not seen for this long are pruned.
    pub idle_secs: u64,
    /// Mark cookies `Secure` (production only).
    pub secure_cookies: bool,
}

/// Firebase project settings (identity toolkit + realtime database).
#[derive(Debug, Clone)]
pub struct FirebaseSettings {
    /// Web API key of the Firebase project.
    pub api_key: SecretString,
    /// Realtime database root, e.g. `https://<project>-default-rtdb.<region>.firebasedatabase.app`
    pub database_url: String,
    pub identity_url: String,
    pub secure_token_url: String,
}

/// Google OAuth client used for federated sign-in.
#[derive(Debug, Clone)]
pub struct GoogleOAuthSettings {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Absolute callback URL registered with Google.
    pub redirect_url: String,
    pub authorize_url: String,
    pub token_url: String,
}

/// Upload flow settings.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// How long the success state is held before the batch clears.
    pub success_display_ms: u64,
    /// Maximum upload requests processed at once (bounds buffered image memory).
    pub max_concurrent_uploads: usize,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory for static assets served under `/assets`
    pub static_dir: Option<PathBuf>,
    pub session: SessionSettings,
    /// Firebase project; `None` selects the in-memory provider and store (development only)
    pub firebase: Option<FirebaseSettings>,
    /// Google OAuth client; `None` disables federated sign-in
    pub google_oauth: Option<GoogleOAuthSettings>,
    pub upload: UploadSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development) every variable has a default
    /// and a missing Firebase project falls back to in-memory collaborators.
    /// In production mode Firebase settings and a real session secret are required.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `TCC_HOST`, `TCC_PORT`: bind address (default: 127.0.0.1:8080)
    /// - `TCC_STATIC_DIR`: static assets directory
    /// - `TCC_SESSION_SECRET`: session cookie signing secret
    /// - `TCC_SESSION_TTL_SECS`: session cookie lifetime (default: 7 days)
    /// - `TCC_SESSION_IDLE_SECS`: idle session pruning threshold (default: 1 day)
    /// - `TCC_SUCCESS_DISPLAY_MS`: upload success display window (default: 2000)
    /// - `TCC_MAX_CONCURRENT_UPLOADS`: concurrent upload requests (default: 4)
    /// - `FIREBASE_API_KEY`, `FIREBASE_DATABASE_URL`: Firebase project
    /// - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URL`: federated sign-in
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("TCC_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("TCC_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("TCC_PORT must be a valid port number"))?;

        let static_dir = env::var("TCC_STATIC_DIR").ok().map(PathBuf::from);

        let session = SessionSettings {
            secret: SecretString::from(
                env::var("TCC_SESSION_SECRET")
                    .unwrap_or_else(|_| defaults::DEV_SESSION_SECRET.to_string()),
            ),
            ttl_secs: parse_env_or("TCC_SESSION_TTL_SECS", defaults::DEV_SESSION_TTL_SECS)
                .map_err(|_| {
                    ConfigError::InvalidValue("TCC_SESSION_TTL_SECS must be a valid number")
                })?,
            idle_secs: parse_env_or("TCC_SESSION_IDLE_SECS", defaults::DEV_SESSION_IDLE_SECS)
                .map_err(|_| {
                    ConfigError::InvalidValue("TCC_SESSION_IDLE_SECS must be a valid number")
                })?,
            secure_cookies: environment.is_production(),
        };

        let upload = UploadSettings {
            success_display_ms: parse_env_or(
                "TCC_SUCCESS_DISPLAY_MS",
                defaults::DEV_SUCCESS_DISPLAY_MS,
            )
            .map_err(|_| ConfigError::InvalidValue("TCC_SUCCESS_DISPLAY_MS must be a valid number"))?,
            max_concurrent_uploads: parse_env_or(
                "TCC_MAX_CONCURRENT_UPLOADS",
                defaults::DEV_MAX_CONCURRENT_UPLOADS,
            )
            .map_err(|_| {
                ConfigError::InvalidValue("TCC_MAX_CONCURRENT_UPLOADS must be a valid number")
            })?,
        };

        let firebase = match (env::var("FIREBASE_API_KEY"), env::var("FIREBASE_DATABASE_URL")) {
            (Ok(api_key), Ok(database_url)) => Some(FirebaseSettings {
                api_key: SecretString::from(api_key),
                database_url: database_url.trim_end_matches('/').to_string(),
                identity_url: defaults::FIREBASE_IDENTITY_URL.to_string(),
                secure_token_url: defaults::FIREBASE_SECURE_TOKEN_URL.to_string(),
            }),
            (Err(_), Err(_)) => None,
            (Err(_), Ok(_)) => return Err(ConfigError::MissingEnvVar("FIREBASE_API_KEY")),
            (Ok(_), Err(_)) => return Err(ConfigError::MissingEnvVar("FIREBASE_DATABASE_URL")),
        };

        let google_oauth = match env::var("GOOGLE_CLIENT_ID") {
            Ok(client_id) => Some(GoogleOAuthSettings {
                client_id,
                client_secret: SecretString::from(
                    env::var("GOOGLE_CLIENT_SECRET")
                        .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_CLIENT_SECRET"))?,
                ),
                redirect_url: env::var("GOOGLE_REDIRECT_URL")
                    .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_REDIRECT_URL"))?,
                authorize_url: defaults::GOOGLE_AUTHORIZE_URL.to_string(),
                token_url: defaults::GOOGLE_TOKEN_URL.to_string(),
            }),
            Err(_) => None,
        };

        let config = Config {
            environment,
            host,
            port,
            static_dir,
            session,
            firebase,
            google_oauth,
            upload,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.session.secret.expose_secret() == defaults::DEV_SESSION_SECRET {
            errors.push(
                "TCC_SESSION_SECRET is using development default. Set a secure session secret."
                    .to_string(),
            );
        }

        if self.firebase.is_none() {
            errors.push(
                "FIREBASE_API_KEY/FIREBASE_DATABASE_URL are not set. In-memory accounts and uploads are development only."
                    .to_string(),
            );
        }

        if let Some(ref google) = self.google_oauth
            && !google.redirect_url.starts_with("https://")
        {
            errors.push(format!(
                "GOOGLE_REDIRECT_URL '{}' must use https in production.",
                google.redirect_url
            ));
        }

        if self.upload.max_concurrent_uploads == 0 {
            errors.push("TCC_MAX_CONCURRENT_UPLOADS must be at least 1.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

fn parse_env_or<T>(name: &str, default: T) -> Result<T, T::Err>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>(),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
