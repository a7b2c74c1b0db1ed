use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error while accessing the terminal: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unrecognized command: '{0}'")]
    ParseCommand(String),

    /// The snapshot file could not be read, decoded or written.
    #[error("Storage failure: {0}")]
    Persistence(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl AppError {
    /// Errors a session recovers from by reporting them and reading the next line.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_) | AppError::ParseCommand(_) | AppError::Validation(_)
        )
    }
}
