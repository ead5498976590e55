use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Category entity - a node of the catalog's category tree, stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (stored as _id in MongoDB), immutable after creation
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Category name; unique among siblings of the same parent
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Parent category; `None` for root-level categories
    pub parent_id: Option<Uuid>,
    /// Sibling display order; non-negative, unique per parent bucket
    pub order: i64,
    /// Reference into the files collection
    pub image_id: Option<Uuid>,
    /// Cached display URL of the referenced file
    pub image_url: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new category
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    /// Explicit sibling position; appended after the last sibling when omitted
    pub order: Option<i64>,
    /// Raw image identifier as supplied by the client; resolved (never
    /// trusted) before it reaches the entity
    pub image_id: Option<String>,
}

/// DTO for updating an existing category
///
/// Nullable fields use `Option<Option<T>>` so a patch can distinguish
/// "leave untouched" (`None`) from "clear" (`Some(None)`) from "set"
/// (`Some(Some(value))`).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub parent_id: Option<Option<Uuid>>,
    pub order: Option<i64>,
    pub image_id: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

/// Query filters for listing categories (equality conjunction)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryFilter {
    /// Filter by exact name
    pub name: Option<String>,
    /// Filter by parent category
    pub parent_id: Option<Uuid>,
}

/// One entry of a bulk reorder request
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderEntry {
    pub id: Uuid,
    pub order: i64,
}

impl Category {
    /// Create a new category from a CreateCategory DTO at the given order
    ///
    /// Image fields start empty; the service fills them after resolving the
    /// raw identifier.
    pub fn new(input: CreateCategory, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            parent_id: input.parent_id,
            order,
            image_id: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this category sits at the root of the tree
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Normalize a raw optional identifier: blank and whitespace-only strings
/// mean the same as an absent value.
///
/// Applied to every identifier-typed optional field that crosses the
/// service boundary.
pub fn normalize_raw_id(raw: Option<&str>) -> Option<&str> {
    match raw {
        Some(s) if s.trim().is_empty() => None,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_category_is_rootless_by_default() {
        let category = Category::new(
            CreateCategory {
                name: "Drinks".to_string(),
                description: None,
                parent_id: None,
                order: None,
                image_id: None,
            },
            0,
        );

        assert!(category.is_root());
        assert_eq!(category.order, 0);
        assert_eq!(category.created_at, category.updated_at);
        assert!(category.image_id.is_none());
    }

    #[test]
    fn test_new_category_keeps_parent() {
        let parent_id = Uuid::now_v7();
        let category = Category::new(
            CreateCategory {
                name: "Juices".to_string(),
                description: Some("cold".to_string()),
                parent_id: Some(parent_id),
                order: None,
                image_id: None,
            },
            3,
        );

        assert!(!category.is_root());
        assert_eq!(category.parent_id, Some(parent_id));
        assert_eq!(category.order, 3);
    }

    #[test]
    fn test_normalize_raw_id() {
        assert_eq!(normalize_raw_id(None), None);
        assert_eq!(normalize_raw_id(Some("")), None);
        assert_eq!(normalize_raw_id(Some("   ")), None);
        assert_eq!(normalize_raw_id(Some("abc")), Some("abc"));
    }
}
