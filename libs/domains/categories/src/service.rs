//! Category Service - the tree engine
//!
//! Owns the invariants of the parent/child/order structure: per-parent name
//! uniqueness, acyclic parent chains, non-negative gap-aware sibling
//! orders, image autofill, and cascading deletion. Every order change
//! outside of create's auto-append funnels through one range-shift
//! algorithm so sibling orders stay a permutation.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{
    Category, CategoryFilter, CreateCategory, ReorderEntry, UpdateCategory, normalize_raw_id,
};
use crate::repository::{CategoryRepository, ImageRef, ImageResolver};

/// Descendant collection queries at most this many parents per round trip
const DESCENDANT_BATCH: usize = 100;

/// Category service providing the tree engine operations
///
/// Constructed with injected collaborators; no global state. Cloning is
/// cheap (both collaborators are shared behind `Arc`).
pub struct CategoryService<R: CategoryRepository, I: ImageResolver> {
    repository: Arc<R>,
    images: Arc<I>,
}

impl<R: CategoryRepository, I: ImageResolver> CategoryService<R, I> {
    pub fn new(repository: R, images: I) -> Self {
        Self {
            repository: Arc::new(repository),
            images: Arc::new(images),
        }
    }

    /// Create a new category
    ///
    /// The parent must exist, the name must be free among its siblings, and
    /// an explicit order must be non-negative. Without an explicit order
    /// the category is appended after the last sibling (order 0 in an empty
    /// bucket). A raw image id is resolved through the image resolver and
    /// both image fields are filled from the stored record; blank ids count
    /// as absent.
    #[instrument(skip(self, input), fields(category_name = %input.name))]
    pub async fn create_category(&self, input: CreateCategory) -> CategoryResult<Category> {
        input
            .validate()
            .map_err(|e| CategoryError::Validation(e.to_string()))?;

        if let Some(parent_id) = input.parent_id {
            self.ensure_parent_exists(parent_id).await?;
        }

        self.ensure_name_available(input.parent_id, &input.name, None)
            .await?;

        let order = match input.order {
            Some(order) if order < 0 => {
                return Err(CategoryError::InvalidOrder(
                    "order must be a non-negative integer".to_string(),
                ));
            }
            Some(order) => order,
            None => self.next_order(input.parent_id).await?,
        };

        let image = match normalize_raw_id(input.image_id.as_deref()) {
            Some(raw) => Some(self.resolve_image(raw).await?),
            None => None,
        };

        let mut category = Category::new(input, order);
        if let Some(ImageRef { id, url }) = image {
            category.image_id = Some(id);
            category.image_url = Some(url);
        }

        self.repository.insert(&category).await?;

        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Get a category by ID
    #[instrument(skip(self))]
    pub async fn get_category(&self, id: Uuid) -> CategoryResult<Category> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))
    }

    /// List categories with optional equality filters
    ///
    /// Results come back in the canonical `(parent_id, order)` order.
    /// `page` is 1-based; `page` and `limit` are clamped to at least 1. The
    /// returned total counts every match, ignoring pagination.
    #[instrument(skip(self, filter))]
    pub async fn list_categories(
        &self,
        filter: CategoryFilter,
        page: u64,
        limit: i64,
    ) -> CategoryResult<(Vec<Category>, u64)> {
        let page = page.max(1);
        let limit = limit.max(1);
        let skip = (page - 1) * limit as u64;

        let items = self.repository.list(&filter, skip, limit).await?;
        let total = self.repository.count(&filter).await?;
        Ok((items, total))
    }

    /// Update an existing category (partial-update semantics)
    ///
    /// Only fields present in the patch are considered; nullable fields
    /// distinguish an explicit null (clear) from absence. A parent change
    /// is validated for existence and against cycles; name uniqueness is
    /// re-checked on the effective post-patch `(name, parent_id)` pair.
    /// Order changes go through the same range-shift algorithm as
    /// [`reorder_single`](Self::reorder_single).
    #[instrument(skip(self, patch))]
    pub async fn update_category(
        &self,
        id: Uuid,
        patch: UpdateCategory,
    ) -> CategoryResult<Category> {
        patch
            .validate()
            .map_err(|e| CategoryError::Validation(e.to_string()))?;

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        // Effective parent after the patch
        let new_parent = match patch.parent_id {
            Some(Some(parent_id)) => {
                self.ensure_parent_exists(parent_id).await?;
                self.ensure_no_cycle(id, parent_id).await?;
                Some(parent_id)
            }
            Some(None) => None,
            None => current.parent_id,
        };
        let parent_changed = new_parent != current.parent_id;

        // Name uniqueness on the effective pair, excluding the record itself
        let new_name = patch.name.clone().unwrap_or_else(|| current.name.clone());
        self.ensure_name_available(new_parent, &new_name, Some(id))
            .await?;

        let now = Utc::now();
        let mut updated = current.clone();
        updated.name = new_name;
        updated.parent_id = new_parent;
        if let Some(description) = patch.description {
            updated.description = description;
        }

        // Image fields: an explicit null or blank id clears both; a
        // resolvable id backfills the URL unless the patch carries one.
        match patch.image_id {
            None => {
                if let Some(image_url) = patch.image_url {
                    updated.image_url = image_url;
                }
            }
            Some(raw) => match normalize_raw_id(raw.as_deref()) {
                None => {
                    updated.image_id = None;
                    updated.image_url = None;
                }
                Some(raw) => {
                    let image = self.resolve_image(raw).await?;
                    updated.image_id = Some(image.id);
                    updated.image_url = match patch.image_url {
                        Some(Some(url)) => Some(url),
                        Some(None) | None => Some(image.url),
                    };
                }
            },
        }

        // Order changes route through the consolidated shift algorithm:
        // a move within the same bucket reflows the range between old and
        // new position; a move into another parent's bucket makes room at
        // the requested slot. A parent move without an explicit order
        // keeps the current order value.
        if let Some(new_order) = patch.order {
            if new_order < 0 {
                return Err(CategoryError::InvalidOrder(
                    "order must be a non-negative integer".to_string(),
                ));
            }
            if parent_changed {
                self.repository
                    .shift_orders_from(new_parent, new_order, 1, id, now)
                    .await?;
                updated.order = new_order;
            } else if new_order != current.order {
                self.shift_between(current.parent_id, current.order, new_order, id, now)
                    .await?;
                updated.order = new_order;
            }
        }

        updated.updated_at = now;
        self.repository.replace(&updated).await?;

        tracing::info!(category_id = %id, "Category updated");
        Ok(updated)
    }

    /// Delete a category and all of its descendants
    ///
    /// Descendant ids are collected breadth-first (a query only returns
    /// direct children) and the whole set is removed in one bulk delete.
    /// Returns the number of removed categories.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> CategoryResult<u64> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(CategoryError::NotFound(id));
        }

        let mut ids = vec![id];
        ids.extend(self.collect_descendants(id).await?);

        let removed = self.repository.delete_by_ids(&ids).await?;
        tracing::info!(category_id = %id, removed, "Category deleted with descendants");
        Ok(removed)
    }

    /// Bulk reorder categories that share one parent
    ///
    /// Orders in the batch must be non-negative and mutually distinct, and
    /// every referenced category must exist. The batch is not validated
    /// against unlisted siblings: callers submit the complete sibling set
    /// or accept duplicate/gap orders.
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    pub async fn reorder(&self, entries: Vec<ReorderEntry>) -> CategoryResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut parents: HashSet<Option<Uuid>> = HashSet::new();
        let mut orders: HashSet<i64> = HashSet::new();

        for entry in &entries {
            if entry.order < 0 {
                return Err(CategoryError::InvalidOrder(
                    "order must be a non-negative integer".to_string(),
                ));
            }
            if !orders.insert(entry.order) {
                return Err(CategoryError::InvalidOrder(format!(
                    "duplicate order value {}",
                    entry.order
                )));
            }

            let category = self
                .repository
                .find_by_id(entry.id)
                .await?
                .ok_or(CategoryError::NotFound(entry.id))?;
            parents.insert(category.parent_id);
        }

        if parents.len() > 1 {
            return Err(CategoryError::MixedParents);
        }

        let now = Utc::now();
        for entry in &entries {
            self.repository
                .set_order(entry.id, entry.order, now)
                .await?;
        }

        tracing::info!(count = entries.len(), "Categories reordered");
        Ok(())
    }

    /// Move one category to a new position among its siblings
    ///
    /// Siblings between the old and new position shift one step toward the
    /// vacated slot, so the bucket's orders stay a permutation. Setting the
    /// current order again is a no-op.
    #[instrument(skip(self))]
    pub async fn reorder_single(&self, id: Uuid, new_order: i64) -> CategoryResult<()> {
        if new_order < 0 {
            return Err(CategoryError::InvalidOrder(
                "order cannot be negative".to_string(),
            ));
        }

        let target = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        if new_order == target.order {
            return Ok(());
        }

        let now = Utc::now();
        self.shift_between(target.parent_id, target.order, new_order, id, now)
            .await?;
        self.repository.set_order(id, new_order, now).await?;

        tracing::info!(category_id = %id, new_order, "Category moved");
        Ok(())
    }

    // ---- helpers ----

    async fn ensure_parent_exists(&self, parent_id: Uuid) -> CategoryResult<()> {
        self.repository
            .find_by_id(parent_id)
            .await?
            .map(|_| ())
            .ok_or(CategoryError::ParentNotFound(parent_id))
    }

    /// Walk the prospective parent's ancestor chain; finding `id` there
    /// means the reassignment would close a loop.
    async fn ensure_no_cycle(&self, id: Uuid, new_parent: Uuid) -> CategoryResult<()> {
        let mut cursor = Some(new_parent);
        while let Some(ancestor_id) = cursor {
            if ancestor_id == id {
                return Err(CategoryError::Cycle(id));
            }
            cursor = match self.repository.find_by_id(ancestor_id).await? {
                Some(ancestor) => ancestor.parent_id,
                // Broken chain: existence is validated separately
                None => None,
            };
        }
        Ok(())
    }

    async fn ensure_name_available(
        &self,
        parent_id: Option<Uuid>,
        name: &str,
        exclude: Option<Uuid>,
    ) -> CategoryResult<()> {
        let taken = self
            .repository
            .find_sibling_by_name(parent_id, name, exclude)
            .await?;
        match taken {
            Some(_) => Err(CategoryError::DuplicateName(name.to_string())),
            None => Ok(()),
        }
    }

    async fn next_order(&self, parent_id: Option<Uuid>) -> CategoryResult<i64> {
        let max = self.repository.max_sibling_order(parent_id).await?;
        Ok(max.map(|m| m + 1).unwrap_or(0))
    }

    async fn resolve_image(&self, raw: &str) -> CategoryResult<ImageRef> {
        self.images
            .resolve(raw)
            .await?
            .ok_or_else(|| CategoryError::InvalidImageRef(raw.to_string()))
    }

    /// Single-step reflow between two positions in one sibling bucket
    async fn shift_between(
        &self,
        parent_id: Option<Uuid>,
        current: i64,
        new: i64,
        exclude: Uuid,
        now: DateTime<Utc>,
    ) -> CategoryResult<()> {
        let direction: i64 = if new > current { 1 } else { -1 };
        let (low, high) = if current <= new {
            (current, new)
        } else {
            (new, current)
        };

        self.repository
            .shift_sibling_orders(parent_id, low, high, -direction, exclude, now)
            .await?;
        Ok(())
    }

    async fn collect_descendants(&self, root: Uuid) -> CategoryResult<Vec<Uuid>> {
        let mut descendants: Vec<Uuid> = Vec::new();
        let mut queue: Vec<Uuid> = vec![root];

        while !queue.is_empty() {
            let take = queue.len().min(DESCENDANT_BATCH);
            let batch: Vec<Uuid> = queue.drain(..take).collect();

            let children = self.repository.find_child_ids(&batch).await?;
            if children.is_empty() {
                continue;
            }

            descendants.extend(children.iter().copied());
            queue.extend(children);
        }

        Ok(descendants)
    }
}

impl<R: CategoryRepository, I: ImageResolver> Clone for CategoryService<R, I> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            images: Arc::clone(&self.images),
        }
    }
}
