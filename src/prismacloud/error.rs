use thiserror::Error;

/// Errors returned by Prisma Cloud API calls.
///
/// SECURITY: Error messages must NEVER contain credentials or the session token.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Login rejected or session token invalid/expired
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// API returned an error status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("rate limited by Prisma Cloud API")]
    RateLimited,

    /// Object does not exist yet, or no longer exists
    #[error("object not found: {what}")]
    NotFound { what: String },

    /// Response body did not have the expected shape
    #[error("unexpected response for {what}: {message}")]
    Decode { what: String, message: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Whether another attempt may succeed without changing the request.
    ///
    /// Not-found counts as transient because newly written objects are not
    /// immediately readable.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::NotFound { .. } | ApiError::RateLimited | ApiError::Network(_) => true,
            ApiError::Api { status, .. } => *status >= 500,
            ApiError::Auth { .. } | ApiError::Decode { .. } => false,
        }
    }
}
