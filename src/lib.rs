use thiserror::Error;

pub type Result<T> = std::result::Result<T, TutorError>;

#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("History error: {0}")]
    History(String),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] retrieval::RetrievalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod extract;
pub mod history;
pub mod openrouter;
pub mod retrieval;
pub mod session;
