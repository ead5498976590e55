use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// File record - metadata for an uploaded file stored in MongoDB
///
/// The bytes themselves live wherever the upload pipeline put them; this
/// record only tracks the identifier-to-URL mapping plus bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Public URL the file is served from
    pub url: String,
    /// Original filename, when known
    pub filename: Option<String>,
    /// MIME type, when known
    pub content_type: Option<String>,
    /// Size in bytes, when known
    pub size_bytes: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// DTO for registering a new file record
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFile {
    #[validate(length(min = 1))]
    pub url: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    #[validate(range(min = 0))]
    pub size_bytes: Option<i64>,
}

/// DTO for updating an existing file record
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateFile {
    #[validate(length(min = 1))]
    pub url: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    #[validate(range(min = 0))]
    pub size_bytes: Option<i64>,
}

/// The resolver's view of a file: just enough to fill an image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    pub id: Uuid,
    pub url: String,
}

impl StoredFile {
    /// Create a new file record from a CreateFile DTO
    pub fn new(input: CreateFile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            url: input.url,
            filename: input.filename,
            content_type: input.content_type,
            size_bytes: input.size_bytes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply updates from an UpdateFile DTO
    pub fn apply_update(&mut self, update: UpdateFile) {
        if let Some(url) = update.url {
            self.url = url;
        }
        if let Some(filename) = update.filename {
            self.filename = Some(filename);
        }
        if let Some(content_type) = update.content_type {
            self.content_type = Some(content_type);
        }
        if let Some(size_bytes) = update.size_bytes {
            self.size_bytes = Some(size_bytes);
        }
        self.updated_at = Utc::now();
    }

    /// The resolver's view of this record
    pub fn as_ref_view(&self) -> FileRef {
        FileRef {
            id: self.id,
            url: self.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_timestamps_and_id() {
        let file = StoredFile::new(CreateFile {
            url: "/static/a.png".to_string(),
            filename: Some("a.png".to_string()),
            content_type: Some("image/png".to_string()),
            size_bytes: Some(1024),
        });

        assert!(!file.id.is_nil());
        assert_eq!(file.created_at, file.updated_at);
        assert_eq!(file.url, "/static/a.png");
    }

    #[test]
    fn test_apply_update_only_touches_given_fields() {
        let mut file = StoredFile::new(CreateFile {
            url: "/static/a.png".to_string(),
            filename: Some("a.png".to_string()),
            content_type: None,
            size_bytes: None,
        });

        file.apply_update(UpdateFile {
            url: Some("/static/b.png".to_string()),
            ..Default::default()
        });

        assert_eq!(file.url, "/static/b.png");
        assert_eq!(file.filename.as_deref(), Some("a.png"));
    }
}
