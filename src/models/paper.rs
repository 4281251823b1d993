//! Catalog rows for the paper library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A paper known to the catalog.
///
/// Rows appear lazily the first time a file is downloaded; the filesystem
/// stays the source of truth for listings.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Paper {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// File name as it appears in the library directory. Unique.
    pub file_name: String,

    /// Catalog tag, `exam` or `key`.
    pub category: String,

    /// Grade token parsed from the file name, when present.
    pub grade: Option<String>,

    /// When the catalog first saw this file.
    pub first_seen: DateTime<Utc>,
}

/// One download occurrence, insert-only.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct DownloadEvent {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Reference to the downloaded paper.
    pub paper_id: Uuid,

    /// Event kind; currently always `download`.
    pub event: String,

    /// When the download happened.
    pub occurred_at: DateTime<Utc>,
}
