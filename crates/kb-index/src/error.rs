use thiserror::Error;

#[derive(Error, Debug)]
pub enum KbError {
    #[error("Failed to read knowledge-base file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed knowledge-base snapshot: {0}")]
    MalformedSnapshot(#[from] serde_json::Error),

    #[error("Snapshot is inconsistent: {0}")]
    InconsistentSnapshot(String),

    #[error("Cannot build an index from an empty corpus")]
    EmptyCorpus,
}
