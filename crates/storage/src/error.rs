use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("state path has no file name: {0}")]
    InvalidPath(String),

    #[error("no tracked session with id {0}")]
    UnknownResource(String),

    #[error("a snooze needs an end time")]
    SnoozeWithoutEnd,
}
