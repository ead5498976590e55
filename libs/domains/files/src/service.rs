//! File Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{FileError, FileResult};
use crate::models::{CreateFile, FileRef, StoredFile, UpdateFile};
use crate::repository::FileRepository;

/// File service providing record management and identifier resolution
pub struct FileService<R: FileRepository> {
    repository: Arc<R>,
}

impl<R: FileRepository> FileService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Register a new file record
    #[instrument(skip(self, input))]
    pub async fn create_file(&self, input: CreateFile) -> FileResult<StoredFile> {
        input
            .validate()
            .map_err(|e| FileError::Validation(e.to_string()))?;

        let file = StoredFile::new(input);
        self.repository.insert(&file).await?;
        Ok(file)
    }

    /// Get a file record by id
    #[instrument(skip(self))]
    pub async fn get_file(&self, id: Uuid) -> FileResult<StoredFile> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(FileError::NotFound(id))
    }

    /// List file records, newest first
    #[instrument(skip(self))]
    pub async fn list_files(&self, page: u64, limit: i64) -> FileResult<(Vec<StoredFile>, u64)> {
        let page = page.max(1);
        let limit = limit.max(1);
        let skip = (page - 1) * limit as u64;

        let items = self.repository.list(skip, limit).await?;
        let total = self.repository.count().await?;
        Ok((items, total))
    }

    /// Update an existing file record
    #[instrument(skip(self, input))]
    pub async fn update_file(&self, id: Uuid, input: UpdateFile) -> FileResult<StoredFile> {
        input
            .validate()
            .map_err(|e| FileError::Validation(e.to_string()))?;

        let mut file = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(FileError::NotFound(id))?;

        file.apply_update(input);
        self.repository.replace(&file).await?;
        Ok(file)
    }

    /// Delete a file record
    #[instrument(skip(self))]
    pub async fn delete_file(&self, id: Uuid) -> FileResult<()> {
        if !self.repository.delete(id).await? {
            return Err(FileError::NotFound(id));
        }
        Ok(())
    }

    /// Resolve a loosely-typed file identifier to its canonical reference
    ///
    /// Returns `None` when nothing matches; the caller decides whether that
    /// is an error.
    #[instrument(skip(self))]
    pub async fn resolve(&self, raw: &str) -> FileResult<Option<FileRef>> {
        let found = self.repository.find_by_any_id(raw).await?;
        Ok(found.map(|f| f.as_ref_view()))
    }
}

impl<R: FileRepository> Clone for FileService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
