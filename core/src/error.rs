use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("ticket #{0} not found")]
    NotFound(i64),
    #[error("admin privileges required")]
    Unauthorized,
    #[error("notification failed: {0}")]
    Notification(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }
}
