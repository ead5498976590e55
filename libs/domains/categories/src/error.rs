use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    #[error("Parent category not found: {0}")]
    ParentNotFound(Uuid),

    #[error("Category with name '{0}' already exists under the same parent")]
    DuplicateName(String),

    #[error("Cannot use category {0} as parent: it would create a cycle")]
    Cycle(Uuid),

    #[error("All categories in a reorder batch must share the same parent")]
    MixedParents,

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid image reference: {0}")]
    InvalidImageRef(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CategoryResult<T> = Result<T, CategoryError>;

impl From<mongodb::error::Error> for CategoryError {
    fn from(err: mongodb::error::Error) -> Self {
        CategoryError::Database(err.to_string())
    }
}
