//! MongoDB implementations of the category collaborator contracts
//!
//! All BSON shaping and identifier-representation coercion happens here;
//! the service layer only ever sees typed entities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc, to_bson},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{Category, CategoryFilter};
use crate::repository::{CategoryRepository, ImageRef, ImageResolver};

/// MongoDB implementation of the CategoryRepository
pub struct MongoCategoryRepository {
    collection: Collection<Category>,
}

impl MongoCategoryRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<Category>("categories"),
        }
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Category>(collection_name),
        }
    }

    /// Initialize indexes
    ///
    /// The unique `(parent_id, name)` index is the real guard for sibling
    /// name uniqueness; the service's pre-check only exists to produce a
    /// typed error before the write.
    pub async fn init_indexes(&self) -> CategoryResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "parent_id": 1, "name": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("uniq_name_per_parent".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "parent_id": 1, "order": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_parent_order".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Category indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Category> {
        &self.collection
    }

    /// BSON form of an optional parent id (`None` matches the root bucket)
    fn parent_bson(parent_id: Option<Uuid>) -> Bson {
        match parent_id {
            Some(id) => to_bson(&id).unwrap_or(Bson::Null),
            None => Bson::Null,
        }
    }

    fn id_bson(id: Uuid) -> Bson {
        to_bson(&id).unwrap_or(Bson::Null)
    }

    /// Build a MongoDB filter document from a CategoryFilter
    fn build_filter(filter: &CategoryFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref name) = filter.name {
            doc.insert("name", name);
        }

        if let Some(parent_id) = filter.parent_id {
            doc.insert("parent_id", Self::id_bson(parent_id));
        }

        doc
    }

    /// Map a write error onto the domain taxonomy: a duplicate-key
    /// violation of the `(parent_id, name)` index means the sibling name
    /// is taken, everything else is a database failure.
    fn map_write_err(err: mongodb::error::Error, name: &str) -> CategoryError {
        if let ErrorKind::Write(WriteFailure::WriteError(ref write_error)) = *err.kind {
            if write_error.code == 11000 {
                return CategoryError::DuplicateName(name.to_string());
            }
        }
        err.into()
    }
}

#[async_trait]
impl CategoryRepository for MongoCategoryRepository {
    #[instrument(skip(self, category), fields(category_name = %category.name))]
    async fn insert(&self, category: &Category) -> CategoryResult<()> {
        self.collection
            .insert_one(category)
            .await
            .map_err(|e| Self::map_write_err(e, &category.name))?;

        tracing::info!(category_id = %category.id, "Category created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>> {
        let filter = doc! { "_id": Self::id_bson(id) };
        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip(self))]
    async fn find_sibling_by_name(
        &self,
        parent_id: Option<Uuid>,
        name: &str,
        exclude: Option<Uuid>,
    ) -> CategoryResult<Option<Category>> {
        let mut filter = doc! {
            "parent_id": Self::parent_bson(parent_id),
            "name": name,
        };
        if let Some(exclude) = exclude {
            filter.insert("_id", doc! { "$ne": Self::id_bson(exclude) });
        }

        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip(self))]
    async fn max_sibling_order(&self, parent_id: Option<Uuid>) -> CategoryResult<Option<i64>> {
        let filter = doc! { "parent_id": Self::parent_bson(parent_id) };
        let options = mongodb::options::FindOneOptions::builder()
            .sort(doc! { "order": -1 })
            .build();

        let last = self
            .collection
            .find_one(filter)
            .with_options(options)
            .await?;
        Ok(last.map(|category| category.order))
    }

    #[instrument(skip(self, filter))]
    async fn list(
        &self,
        filter: &CategoryFilter,
        skip: u64,
        limit: i64,
    ) -> CategoryResult<Vec<Category>> {
        let mongo_filter = Self::build_filter(filter);

        // (parent_id, order) ascending is the canonical traversal order
        let options = mongodb::options::FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .sort(doc! { "parent_id": 1, "order": 1 })
            .build();

        let cursor = self
            .collection
            .find(mongo_filter)
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &CategoryFilter) -> CategoryResult<u64> {
        let mongo_filter = Self::build_filter(filter);
        Ok(self.collection.count_documents(mongo_filter).await?)
    }

    #[instrument(skip(self, category), fields(category_id = %category.id))]
    async fn replace(&self, category: &Category) -> CategoryResult<()> {
        let filter = doc! { "_id": Self::id_bson(category.id) };
        self.collection
            .replace_one(filter, category)
            .await
            .map_err(|e| Self::map_write_err(e, &category.name))?;

        tracing::info!(category_id = %category.id, "Category updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_order(
        &self,
        id: Uuid,
        order: i64,
        updated_at: DateTime<Utc>,
    ) -> CategoryResult<()> {
        let filter = doc! { "_id": Self::id_bson(id) };
        let update = doc! {
            "$set": { "order": order, "updated_at": updated_at.to_rfc3339() }
        };

        self.collection.update_one(filter, update).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn shift_sibling_orders(
        &self,
        parent_id: Option<Uuid>,
        low: i64,
        high: i64,
        delta: i64,
        exclude: Uuid,
        updated_at: DateTime<Utc>,
    ) -> CategoryResult<u64> {
        let filter = doc! {
            "parent_id": Self::parent_bson(parent_id),
            "order": { "$gte": low, "$lte": high },
            "_id": { "$ne": Self::id_bson(exclude) },
        };
        let update = doc! {
            "$inc": { "order": delta },
            "$set": { "updated_at": updated_at.to_rfc3339() },
        };

        let result = self.collection.update_many(filter, update).await?;
        tracing::debug!(low, high, delta, shifted = result.modified_count, "Sibling orders shifted");
        Ok(result.modified_count)
    }

    #[instrument(skip(self))]
    async fn shift_orders_from(
        &self,
        parent_id: Option<Uuid>,
        from: i64,
        delta: i64,
        exclude: Uuid,
        updated_at: DateTime<Utc>,
    ) -> CategoryResult<u64> {
        let filter = doc! {
            "parent_id": Self::parent_bson(parent_id),
            "order": { "$gte": from },
            "_id": { "$ne": Self::id_bson(exclude) },
        };
        let update = doc! {
            "$inc": { "order": delta },
            "$set": { "updated_at": updated_at.to_rfc3339() },
        };

        let result = self.collection.update_many(filter, update).await?;
        Ok(result.modified_count)
    }

    #[instrument(skip(self, parent_ids), fields(batch = parent_ids.len()))]
    async fn find_child_ids(&self, parent_ids: &[Uuid]) -> CategoryResult<Vec<Uuid>> {
        let parents: Vec<Bson> = parent_ids.iter().map(|id| Self::id_bson(*id)).collect();
        let filter = doc! { "parent_id": { "$in": parents } };

        let ids = self.collection.distinct("_id", filter).await?;
        Ok(ids
            .into_iter()
            .filter_map(|bson| mongodb::bson::from_bson::<Uuid>(bson).ok())
            .collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_by_ids(&self, ids: &[Uuid]) -> CategoryResult<u64> {
        let id_list: Vec<Bson> = ids.iter().map(|id| Self::id_bson(*id)).collect();
        let filter = doc! { "_id": { "$in": id_list } };

        let result = self.collection.delete_many(filter).await?;
        tracing::info!(removed = result.deleted_count, "Categories deleted");
        Ok(result.deleted_count)
    }
}

/// MongoDB implementation of the ImageResolver, backed by the files
/// collection
///
/// File ids arrive from clients in more than one representation, so the
/// lookup matches the canonical `_id`, a legacy `id` field, and the
/// normalized-UUID form of the raw string.
pub struct MongoImageResolver {
    files: Collection<Document>,
}

impl MongoImageResolver {
    pub fn new(db: &Database) -> Self {
        Self {
            files: db.collection::<Document>("files"),
        }
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            files: db.collection::<Document>(collection_name),
        }
    }

    fn any_id_filter(raw: &str) -> Document {
        let mut clauses = vec![doc! { "_id": raw }, doc! { "id": raw }];
        if let Ok(parsed) = Uuid::parse_str(raw) {
            clauses.push(doc! { "_id": to_bson(&parsed).unwrap_or(Bson::Null) });
        }
        doc! { "$or": clauses }
    }
}

#[async_trait]
impl ImageResolver for MongoImageResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, raw: &str) -> CategoryResult<Option<ImageRef>> {
        let Some(file) = self.files.find_one(Self::any_id_filter(raw)).await? else {
            return Ok(None);
        };

        let url = file
            .get_str("url")
            .map_err(|_| CategoryError::Internal(format!("file record {raw} has no url")))?
            .to_string();

        let id = file
            .get("_id")
            .and_then(|bson| mongodb::bson::from_bson::<Uuid>(bson.clone()).ok())
            .or_else(|| Uuid::parse_str(raw).ok())
            .ok_or_else(|| {
                CategoryError::Internal(format!("file record {raw} has a non-UUID id"))
            })?;

        Ok(Some(ImageRef { id, url }))
    }
}
