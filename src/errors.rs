use thiserror::Error;
use uuid::Uuid;

/// Error type covering every recoverable condition raised by the tin engine.
#[derive(Debug, Error)]
pub enum TinError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Session {0} is closed and accepts no further changes")]
    SessionClosed(Uuid),
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("Session already exists: {0}")]
    DuplicateSession(Uuid),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(Uuid),
    #[error("Persistence error: {0}")]
    PersistenceFailure(String),
    #[error("Stored data is unreadable: {0}")]
    CorruptState(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, TinError>;

impl TinError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TinError::InvalidInput(message.into())
    }
}

impl From<std::io::Error> for TinError {
    fn from(err: std::io::Error) -> Self {
        TinError::PersistenceFailure(err.to_string())
    }
}

impl From<crate::config::ConfigError> for TinError {
    fn from(err: crate::config::ConfigError) -> Self {
        match err {
            crate::config::ConfigError::Io(io) => TinError::PersistenceFailure(io.to_string()),
            crate::config::ConfigError::Serde(message) => TinError::ConfigError(message),
        }
    }
}
