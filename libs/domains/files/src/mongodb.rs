//! MongoDB implementation of FileRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, doc, to_bson},
    options::IndexOptions,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::FileResult;
use crate::models::StoredFile;
use crate::repository::FileRepository;

/// MongoDB implementation of the FileRepository
pub struct MongoFileRepository {
    collection: Collection<StoredFile>,
}

impl MongoFileRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<StoredFile>("files"),
        }
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<StoredFile>(collection_name),
        }
    }

    /// Initialize indexes
    pub async fn init_indexes(&self) -> FileResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("File indexes created successfully");
        Ok(())
    }

    /// Build the `$or` filter matching a loosely-typed identifier
    ///
    /// Matches the canonical `_id`, a legacy `id` field, and the
    /// normalized-UUID form when the raw string parses as one.
    fn any_id_filter(raw: &str) -> mongodb::bson::Document {
        let mut clauses = vec![doc! { "_id": raw }, doc! { "id": raw }];
        if let Ok(parsed) = Uuid::parse_str(raw) {
            clauses.push(doc! { "_id": to_bson(&parsed).unwrap_or(Bson::Null) });
        }
        doc! { "$or": clauses }
    }
}

#[async_trait]
impl FileRepository for MongoFileRepository {
    #[instrument(skip(self, file), fields(file_id = %file.id))]
    async fn insert(&self, file: &StoredFile) -> FileResult<()> {
        self.collection.insert_one(file).await?;
        tracing::info!(file_id = %file.id, "File record created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> FileResult<Option<StoredFile>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip(self))]
    async fn find_by_any_id(&self, raw: &str) -> FileResult<Option<StoredFile>> {
        Ok(self.collection.find_one(Self::any_id_filter(raw)).await?)
    }

    #[instrument(skip(self))]
    async fn list(&self, skip: u64, limit: i64) -> FileResult<Vec<StoredFile>> {
        let options = mongodb::options::FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn count(&self) -> FileResult<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    #[instrument(skip(self, file), fields(file_id = %file.id))]
    async fn replace(&self, file: &StoredFile) -> FileResult<()> {
        let filter = doc! { "_id": to_bson(&file.id).unwrap_or(Bson::Null) };
        self.collection.replace_one(filter, file).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> FileResult<bool> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let result = self.collection.delete_one(filter).await?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_id_filter_plain_string() {
        let filter = MongoFileRepository::any_id_filter("legacy-file-7");
        let clauses = filter.get_array("$or").unwrap();
        // No UUID clause for a string that does not parse as one
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn test_any_id_filter_uuid_string() {
        let id = Uuid::now_v7();
        let filter = MongoFileRepository::any_id_filter(&id.to_string());
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);
    }
}
