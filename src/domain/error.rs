use thiserror::Error;

/// Reasons a URL is rejected before anything is sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a URL")]
    EmptyUrl,

    #[error("Invalid URL for selected platform")]
    PatternMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// Request never got a successful HTTP answer.
    #[error("{0}")]
    Transport(String),

    /// The service answered, but not with something usable.
    #[error("{0}")]
    Protocol(String),

    #[error("Download cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    /// Text shown in the progress area when a job ends in failure.
    pub fn failure_message(&self) -> String {
        match self {
            AppError::Protocol(detail) => format!(
                "Download failed. We apologize for the inconvenience. Error: {}",
                detail
            ),
            other => format!(
                "Download failed. We apologize for the inconvenience. {}",
                other
            ),
        }
    }
}
