use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvoGraphError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Batch cancelled before completion")]
    Cancelled,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
