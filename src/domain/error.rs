use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please enter a valid URL")]
    InvalidUrl,

    #[error("Invalid folder: {0}")]
    InvalidFolder(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),
}
