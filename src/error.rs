use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input format error: {0}")]
    InputFormat(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invariant violated: {0}")]
    InvariantViolated(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
