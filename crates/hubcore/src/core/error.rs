use thiserror::Error;

/// Centralized error type for the hub core.
///
/// Routing misses and ownership violations are not errors: they are dropped
/// and logged where they happen. Everything that reaches this enum is a
/// collaborator failure (storage, transport) or rejected input.
#[derive(Error, Debug)]
pub enum HubError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Transport failures that do not come from the Telegram client
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A looked-up record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Type alias for Result with HubError
pub type HubResult<T> = Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            HubError::Validation("empty wallet".into()).to_string(),
            "Validation error: empty wallet"
        );
        assert_eq!(HubError::Transport("timeout".into()).to_string(), "Transport error: timeout");
    }

    #[test]
    fn test_from_rusqlite() {
        let err: HubError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, HubError::Database(_)));
    }
}
