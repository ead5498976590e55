use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type FileResult<T> = Result<T, FileError>;

impl From<mongodb::error::Error> for FileError {
    fn from(err: mongodb::error::Error) -> Self {
        FileError::Database(err.to_string())
    }
}
