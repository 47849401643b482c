//! Error types for the teamctl CLI

use thiserror::Error;

/// Result type alias for teamctl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Teams API errors.
///
/// The `Display` output is the single message shown to the user next to
/// the view that made the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Unauthorized. Please log in again.")]
    Unauthorized,

    #[error("Forbidden. You don't have permission for this action.")]
    Forbidden,

    /// Any other non-success status; `message` is the server detail or `HTTP <status>`
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Identity broker and session errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Identity broker is not initialized")]
    NotInitialized,

    #[error("Not logged in. Run `teamctl login` to sign in.")]
    NotLoggedIn,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Login request expired before it was approved")]
    LoginExpired,

    #[error("Login was denied")]
    AccessDenied,

    #[error("Identity broker unreachable: {0}")]
    Network(String),

    #[error("Invalid identity broker response: {0}")]
    InvalidResponse(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Network("Request timed out".to_string())
        } else {
            AuthError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
