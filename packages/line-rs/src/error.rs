use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineError {
    /// Transport failure, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the Messaging API
    #[error("LINE API error {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, LineError>;
