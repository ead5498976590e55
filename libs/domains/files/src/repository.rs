use async_trait::async_trait;
use uuid::Uuid;

use crate::error::FileResult;
use crate::models::StoredFile;

/// Repository trait for file record persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Persist a new file record
    async fn insert(&self, file: &StoredFile) -> FileResult<()>;

    /// Get a file record by its canonical id
    async fn find_by_id(&self, id: Uuid) -> FileResult<Option<StoredFile>>;

    /// Get a file record by a loosely-typed identifier
    ///
    /// Clients present file ids in more than one shape (UUID string, legacy
    /// string id); implementations must match any of them.
    async fn find_by_any_id(&self, raw: &str) -> FileResult<Option<StoredFile>>;

    /// List file records, newest first
    async fn list(&self, skip: u64, limit: i64) -> FileResult<Vec<StoredFile>>;

    /// Count all file records
    async fn count(&self) -> FileResult<u64>;

    /// Replace an existing record
    async fn replace(&self, file: &StoredFile) -> FileResult<()>;

    /// Delete a record; returns whether anything was removed
    async fn delete(&self, id: Uuid) -> FileResult<bool>;
}
