//! Categories Domain
//!
//! Manages the catalog's category tree: a hierarchy of categories with
//! per-parent name uniqueness, gap-aware sibling ordering, cycle-safe
//! parent reassignment, cascading deletion, and bulk/single reorder
//! operations. Category images are resolved against the files collection
//! rather than accepted verbatim from callers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Tree invariants, ordering, image autofill
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_categories::{
//!     mongodb::{MongoCategoryRepository, MongoImageResolver},
//!     service::CategoryService,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("catalog");
//!
//! let repository = MongoCategoryRepository::new(&db);
//! repository.init_indexes().await?;
//!
//! let service = CategoryService::new(repository, MongoImageResolver::new(&db));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{CategoryError, CategoryResult};
pub use models::{Category, CategoryFilter, CreateCategory, ReorderEntry, UpdateCategory};
pub use mongodb::{MongoCategoryRepository, MongoImageResolver};
pub use repository::{CategoryRepository, ImageRef, ImageResolver};
pub use service::CategoryService;
