use thiserror::Error;

use psique_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("transcription job failed: {0}")]
    JobFailed(String),

    #[error("transcription did not finish within {0:?}")]
    Timeout(std::time::Duration),

    #[error("transcription API error: {0}")]
    Api(String),

    #[error("failed to parse transcript: {0}")]
    Parse(String),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
