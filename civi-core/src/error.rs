use thiserror::Error;

#[derive(Error, Debug)]
pub enum CiviError {
    #[error("Assistant error: {0}")]
    Assistant(String),

    #[error("Records error: {0}")]
    Records(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Empty content")]
    EmptyContent,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

pub type Result<T> = std::result::Result<T, CiviError>;
