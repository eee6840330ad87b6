//! Document attachment models.

use serde::{Deserialize, Serialize};

/// A file attached to a health record and copied into the document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: i64,
    /// Owning record
    pub record_id: i64,
    /// Original file name (no directory)
    pub file_name: String,
    /// Path of the copy inside the document store
    pub stored_path: String,
    /// Hex SHA-256 of the content at attach time
    pub sha256: String,
    pub size_bytes: u64,
    pub attached_at: String,
}
