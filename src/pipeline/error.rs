use thiserror::Error;

/// Errors surfaced by the outcome tracker
///
/// Provider failures are not represented here: they degrade to absent
/// snapshot fields instead of failing a record.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Signal record not found: {0}")]
    RecordNotFound(String),

    #[error("Checkpoint {checkpoint} already recorded for {address}")]
    CheckpointAlreadyRecorded { address: String, checkpoint: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl TrackerError {
    /// Errors that indicate a bug or bad invocation rather than bad data
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrackerError::InvalidCheckpoint(_) | TrackerError::Config(_) | TrackerError::LockPoisoned
        )
    }
}
