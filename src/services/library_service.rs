//! LibraryService — the storage accessor behind the listing API.
//!
//! Listings come straight from the two library directories on disk; SQLite
//! holds the paper catalog and the download audit trail. Rows appear in the
//! catalog lazily, the first time a file is downloaded, so the filesystem
//! stays the source of truth for what exists.

use crate::models::paper::Paper;
use chrono::Utc;
use sqlx::SqlitePool;
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::fs::{self, File};
use tracing::{debug, warn};
use uuid::Uuid;

const MAX_FILE_NAME_LEN: usize = 255;

/// Fixed set of file groupings the portal serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Exams,
    AnswerKeys,
}

impl Category {
    /// Resolve a route segment into a category. `keys` survives as a legacy
    /// alias for `answer-keys`; anything else is unknown.
    pub fn from_route(segment: &str) -> Option<Self> {
        match segment {
            "exams" => Some(Self::Exams),
            "answer-keys" | "keys" => Some(Self::AnswerKeys),
            _ => None,
        }
    }

    /// Tag stored in the `papers.category` column.
    pub fn catalog_tag(self) -> &'static str {
        match self {
            Self::Exams => "exam",
            Self::AnswerKeys => "key",
        }
    }
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("paper `{name}` not found in `{category:?}`")]
    PaperNotFound { category: Category, name: String },
    #[error("invalid file name")]
    InvalidFileName,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// A file opened for download, plus what the response headers need.
#[derive(Debug)]
pub struct PaperFile {
    pub name: String,
    pub size_bytes: u64,
}

/// LibraryService provides the portal's storage operations:
/// - List the PDF files available in a category
/// - Open one file for streaming out, recording the download in the catalog
///
/// Every request-scoped failure maps to a `LibraryError`; nothing here is
/// retried or cached.
#[derive(Clone)]
pub struct LibraryService {
    /// Shared SQLite connection pool used for the catalog.
    pub db: Arc<SqlitePool>,

    /// Directory holding exam PDFs.
    pub exams_dir: PathBuf,

    /// Directory holding answer-key PDFs.
    pub answer_keys_dir: PathBuf,
}

impl LibraryService {
    pub fn new(
        db: Arc<SqlitePool>,
        exams_dir: impl Into<PathBuf>,
        answer_keys_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db,
            exams_dir: exams_dir.into(),
            answer_keys_dir: answer_keys_dir.into(),
        }
    }

    /// Create the catalog tables when absent. Runs at startup and doubles as
    /// the fail-fast connectivity probe for the configured database.
    pub async fn init_schema(&self) -> LibraryResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS papers (
                id BLOB PRIMARY KEY,
                file_name TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL,
                grade TEXT,
                first_seen TEXT NOT NULL
            )",
        )
        .execute(&*self.db)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS download_events (
                id BLOB PRIMARY KEY,
                paper_id BLOB NOT NULL REFERENCES papers(id),
                event TEXT NOT NULL,
                occurred_at TEXT NOT NULL
            )",
        )
        .execute(&*self.db)
        .await?;

        Ok(())
    }

    fn base_dir(&self, category: Category) -> &Path {
        match category {
            Category::Exams => &self.exams_dir,
            Category::AnswerKeys => &self.answer_keys_dir,
        }
    }

    /// Reject names that could escape the library directory.
    ///
    /// Runs before any filesystem or database lookup. Anything containing a
    /// separator, `..`, control bytes, or a leading dot is refused outright.
    fn ensure_name_safe(name: &str) -> LibraryResult<()> {
        if name.is_empty() || name.len() > MAX_FILE_NAME_LEN {
            return Err(LibraryError::InvalidFileName);
        }
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(LibraryError::InvalidFileName);
        }
        if name.starts_with('.') {
            return Err(LibraryError::InvalidFileName);
        }
        if name.bytes().any(|b| b.is_ascii_control()) {
            return Err(LibraryError::InvalidFileName);
        }
        Ok(())
    }

    /// List the PDF filenames available for a category.
    ///
    /// A missing directory yields an empty list, not an error. Non-PDF
    /// entries and subdirectories are skipped. Sorted case-insensitively;
    /// callers may rely on the order for display only.
    pub async fn list(&self, category: Category) -> LibraryResult<Vec<String>> {
        let dir = self.base_dir(category);
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.to_ascii_lowercase().ends_with(".pdf") {
                names.push(name.to_string());
            }
        }

        names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
        Ok(names)
    }

    /// Open one paper for streaming out.
    ///
    /// Validates the name, resolves it strictly under the category
    /// directory, and records the download in the catalog. A missing file
    /// maps to `PaperNotFound`; a rejected name never reaches the disk.
    pub async fn open(&self, category: Category, name: &str) -> LibraryResult<(PaperFile, File)> {
        Self::ensure_name_safe(name)?;

        let base = self.base_dir(category);
        let path = base.join(name);
        if !path.starts_with(base) {
            return Err(LibraryError::InvalidFileName);
        }

        let file = File::open(&path).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                LibraryError::PaperNotFound {
                    category,
                    name: name.to_string(),
                }
            } else {
                LibraryError::Io(err)
            }
        })?;

        let meta = file.metadata().await?;
        if meta.is_dir() {
            return Err(LibraryError::PaperNotFound {
                category,
                name: name.to_string(),
            });
        }

        // The download still streams when the catalog write fails; the
        // client-facing contract is read-only.
        if let Err(err) = self.record_download(category, name).await {
            warn!("failed to record download of `{}`: {}", name, err);
        }

        Ok((
            PaperFile {
                name: name.to_string(),
                size_bytes: meta.len(),
            },
            file,
        ))
    }

    /// Upsert the paper row and append a download event.
    async fn record_download(&self, category: Category, name: &str) -> LibraryResult<Paper> {
        let paper = sqlx::query_as::<_, Paper>(
            r#"
            INSERT INTO papers (id, file_name, category, grade, first_seen)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(file_name) DO UPDATE SET category = excluded.category
            RETURNING id, file_name, category, grade, first_seen
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(category.catalog_tag())
        .bind(grade_from_name(name))
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;

        sqlx::query(
            "INSERT INTO download_events (id, paper_id, event, occurred_at) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(paper.id)
        .bind("download")
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        debug!("recorded download of `{}` ({})", name, category.catalog_tag());
        Ok(paper)
    }
}

/// The library's filing convention encodes the grade as the second
/// dash-separated token (`algebra-9-midterm.pdf` → `9`).
fn grade_from_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(".pdf").unwrap_or(name);
    let mut parts = stem.split('-');
    parts.next()?;
    parts
        .next()
        .map(|grade| grade.trim().to_string())
        .filter(|grade| !grade.is_empty())
}
