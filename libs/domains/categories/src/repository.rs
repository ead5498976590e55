use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CategoryResult;
use crate::models::{Category, CategoryFilter};

/// Repository trait for Category persistence
///
/// This trait defines the data access interface the category tree engine
/// runs against. The MongoDB implementation lives in [`crate::mongodb`];
/// unit tests run against the generated mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Persist a new category
    async fn insert(&self, category: &Category) -> CategoryResult<()>;

    /// Get a category by ID
    async fn find_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>>;

    /// Find a sibling with the given name under a parent, optionally
    /// excluding one id (the record being updated)
    async fn find_sibling_by_name(
        &self,
        parent_id: Option<Uuid>,
        name: &str,
        exclude: Option<Uuid>,
    ) -> CategoryResult<Option<Category>>;

    /// Highest order value among a parent's children; `None` when the
    /// parent bucket is empty
    async fn max_sibling_order(&self, parent_id: Option<Uuid>) -> CategoryResult<Option<i64>>;

    /// List categories matching a filter, ordered by `(parent_id, order)`
    async fn list(
        &self,
        filter: &CategoryFilter,
        skip: u64,
        limit: i64,
    ) -> CategoryResult<Vec<Category>>;

    /// Count categories matching a filter, ignoring pagination
    async fn count(&self, filter: &CategoryFilter) -> CategoryResult<u64>;

    /// Replace an existing category document
    async fn replace(&self, category: &Category) -> CategoryResult<()>;

    /// Set one category's order, refreshing its update timestamp
    async fn set_order(&self, id: Uuid, order: i64, updated_at: DateTime<Utc>)
    -> CategoryResult<()>;

    /// Shift the order of every sibling whose order falls in `[low, high]`
    /// (inclusive) by `delta`, excluding one id; returns the number of
    /// documents touched
    async fn shift_sibling_orders(
        &self,
        parent_id: Option<Uuid>,
        low: i64,
        high: i64,
        delta: i64,
        exclude: Uuid,
        updated_at: DateTime<Utc>,
    ) -> CategoryResult<u64>;

    /// Shift the order of every sibling whose order is `>= from` by
    /// `delta`, excluding one id; returns the number of documents touched
    async fn shift_orders_from(
        &self,
        parent_id: Option<Uuid>,
        from: i64,
        delta: i64,
        exclude: Uuid,
        updated_at: DateTime<Utc>,
    ) -> CategoryResult<u64>;

    /// Direct children ids for any of the given parents (one batch of the
    /// descendant traversal — only immediate children are returned)
    async fn find_child_ids(&self, parent_ids: &[Uuid]) -> CategoryResult<Vec<Uuid>>;

    /// Bulk delete by id; returns the number of removed documents
    async fn delete_by_ids(&self, ids: &[Uuid]) -> CategoryResult<u64>;
}

/// Resolved view of an image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: Uuid,
    pub url: String,
}

/// Collaborator contract resolving loosely-typed image identifiers
///
/// Clients present file ids in more than one representation (UUID string,
/// legacy string id); implementations must tolerate any of them and return
/// the canonical reference, or `None` when nothing matches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, raw: &str) -> CategoryResult<Option<ImageRef>>;
}
