//! Typed errors for a watcher run.
//!
//! Every variant is fatal for the run; nothing here is retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaleWatchError {
    /// Fetch or push request failed or timed out
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Listing page could not be treated as markup
    #[error("parse error: {reason}")]
    Parse { reason: String },

    /// A keyword-matched row is missing a required field
    #[error("malformed row for store {store:?}: missing {field}")]
    MalformedRow { store: String, field: &'static str },

    /// Push endpoint answered with a non-success status
    #[error("delivery failed with status {status}: {body}")]
    Delivery { status: u16, body: String },

    /// Required environment variable missing
    #[error("config error: {var} must be set")]
    Config { var: &'static str },

    /// Seen-set database failure
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl From<line::LineError> for SaleWatchError {
    fn from(err: line::LineError) -> Self {
        match err {
            line::LineError::Api { status, message } => SaleWatchError::Delivery {
                status,
                body: message,
            },
            other => SaleWatchError::Network(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, SaleWatchError>;
