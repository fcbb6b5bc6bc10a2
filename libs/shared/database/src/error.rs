use thiserror::Error;

/// SQLSTATE Postgres reports for a unique index violation.
pub const UNIQUE_VIOLATION_SQLSTATE: &str = "23505";

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid request header: {0}")]
    Header(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Undecodable response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures a repository can report, independent of the backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed store data: {0}")]
    Malformed(String),
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::UniqueViolation(msg) => StoreError::UniqueViolation(msg),
            SupabaseError::Decode(err) => StoreError::from(err),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}
