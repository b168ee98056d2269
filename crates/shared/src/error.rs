use thiserror::Error;

/// Failures the pipeline can halt on. Each stage owns exactly one kind,
/// and the message carries the raw status or IO detail for the operator.
#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Failed to fetch links from LinkAce: {0}")]
    Fetch(String),

    #[error("Failed to generate digest: {0}")]
    Generation(String),

    #[error("Failed to write digest: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, DigestError>;
