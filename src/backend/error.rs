use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Api(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Storage failed: {0}")]
    Storage(String),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid exam state: {0}")]
    Exam(String),

    #[error("Grading rejected: {0}")]
    Grading(String),

    #[error("Payment verification failed: {0}")]
    Payment(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

pub type AppResult<T> = Result<T, AppError>;
