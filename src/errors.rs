use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid command line usage (e.g. missing date arguments)
    #[error("{message}")]
    Usage { message: String },

    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// HTTP error talking to the metrics backend
    #[error(transparent)]
    Backend(#[from] reqwest::Error),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage { message: message.into() }
    }
}

/// Type alias for operation results
pub type Result<T> = std::result::Result<T, Error>;
