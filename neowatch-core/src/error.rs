use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Malformed asteroid payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid orbital elements: {0}")]
    InvalidElements(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Alert delivery failed: {0}")]
    Alert(String),

    #[error("Asteroid feed request failed: {0}")]
    Feed(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    /// Whether the error stems from the inbound payload rather than from
    /// infrastructure. Such messages are never acknowledged.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::InvalidElements(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
