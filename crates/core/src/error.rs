use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unknown coverage mode: {0}")]
    UnknownCoverageMode(String),

    #[error("invalid chunking policy: {0}")]
    InvalidPolicy(String),
}
