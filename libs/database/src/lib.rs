//! Database library providing the MongoDB connector and utilities used by
//! the domain crates.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `config` - Configuration support with `core_config::FromEnv`
//! - `all` - Everything above
//!
//! # Examples
//!
//! ```ignore
//! use database::mongodb;
//!
//! let client = mongodb::connect("mongodb://localhost:27017").await?;
//! let db = client.database("catalog");
//! let collection = db.collection::<Document>("categories");
//! ```
//!
//! With configuration loaded from the environment (requires `config`):
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::mongodb::{MongoConfig, connect_from_config};
//!
//! let config = MongoConfig::from_env()?;
//! let client = connect_from_config(&config).await?;
//! ```

// Always available modules
pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

// Re-exports for convenience
pub use common::{RetryConfig, retry, retry_with_backoff};
