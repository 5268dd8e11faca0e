use thiserror::Error;

/// Failure taxonomy for the service core.
///
/// Read-path misses never surface here (they degrade to the `"not found!"`
/// sentinel response); `NotFound` is raised only by delete.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("coin not found")]
    NotFound,

    #[error("coindesk fetch failed: {0}")]
    Network(String),

    #[error("malformed coindesk payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
