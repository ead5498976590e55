//! Files Domain
//!
//! Stores metadata records for uploaded files and resolves loosely-typed
//! file identifiers to their display URLs. The category domain uses this
//! collection as the target of its image lookups.
//!
//! Layering follows the workspace convention:
//! `service` (business logic) → `repository` (trait + MongoDB
//! implementation) → `models` (entity + DTOs). Byte storage and upload
//! transport are the consuming application's concern; only the record
//! store lives here.

pub mod error;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{FileError, FileResult};
pub use models::{CreateFile, FileRef, StoredFile, UpdateFile};
pub use mongodb::MongoFileRepository;
pub use repository::FileRepository;
pub use service::FileService;
