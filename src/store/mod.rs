//! Persistent records kept between sessions: recent folders, bookmarks, tags
//! and recently opened files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::app_dirs::{self, AppDirError};
use crate::assets::{Entry, FileType, last_segment};
use crate::browse::{TagIndex, TagRecord};
use crate::provider::EntryHandle;

mod schema;
mod util;

use util::{create_parent_if_needed, folder_bookmark_id, map_sql_error, now_millis};

/// Filename of the record database inside the app directory.
pub const RECORDS_DB_FILE_NAME: &str = "records.db";

/// Errors returned by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite query failed.
    #[error("Record store query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    /// Database is locked or busy.
    #[error("Record store is busy, please retry")]
    Busy,
    /// Failed to create the directory holding the database.
    #[error("Could not create record store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The app directory could not be resolved.
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    /// A record key was empty.
    #[error("Invalid record path: {0:?}")]
    InvalidPath(String),
}

/// A root folder opened in an earlier session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFolder {
    pub name: String,
    pub location: String,
    pub last_opened: i64,
}

impl RecentFolder {
    pub fn handle(&self) -> EntryHandle {
        EntryHandle::from_location(&self.location)
    }
}

/// A bookmarked project root, keyed by its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBookmark {
    pub name: String,
    pub location: String,
    pub added_at: i64,
}

/// A deep link to a folder inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderBookmark {
    pub id: String,
    pub root_name: String,
    pub path: String,
    /// Last path segment, or the root name for the root itself.
    pub name: String,
    pub added_at: i64,
}

/// A file opened for viewing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFile {
    pub path: String,
    pub name: String,
    pub file_type: FileType,
    pub location: Option<String>,
    pub last_opened: i64,
}

/// Record operations the browser depends on. Adds and removes are idempotent.
pub trait RecordStore: Send {
    fn save_folder_handle(&self, name: &str, root: &EntryHandle) -> Result<(), StoreError>;
    /// Newest first.
    fn recent_folders(&self) -> Result<Vec<RecentFolder>, StoreError>;

    /// Returns true when the project is bookmarked afterwards.
    fn toggle_project_bookmark(&self, name: &str, root: &EntryHandle) -> Result<bool, StoreError>;
    fn project_bookmarks(&self) -> Result<Vec<ProjectBookmark>, StoreError>;
    fn is_project_bookmarked(&self, name: &str) -> Result<bool, StoreError>;

    /// Returns true when the folder is bookmarked afterwards.
    fn toggle_folder_bookmark(&self, root_name: &str, path: &str) -> Result<bool, StoreError>;
    /// Bookmarks of one project, newest first.
    fn folder_bookmarks(&self, root_name: &str) -> Result<Vec<FolderBookmark>, StoreError>;
    fn is_folder_bookmarked(&self, root_name: &str, path: &str) -> Result<bool, StoreError>;

    /// Attach `tag` to the entry's path and return the path's tags.
    fn add_tag(&self, entry: &Entry, tag: &str) -> Result<Vec<String>, StoreError>;
    /// Detach `tag`; the record disappears with its last tag.
    fn remove_tag(&self, path: &str, tag: &str) -> Result<Vec<String>, StoreError>;
    fn tags_for_file(&self, path: &str) -> Result<Vec<String>, StoreError>;
    fn all_tags(&self) -> Result<TagIndex, StoreError>;

    /// Record an opened file, keeping at most `limit` entries.
    fn save_recent_file(&self, entry: &Entry, limit: usize) -> Result<(), StoreError>;
    /// Newest first.
    fn recent_files(&self) -> Result<Vec<RecentFile>, StoreError>;
}

/// SQLite-backed [`RecordStore`].
pub struct SqliteRecordStore {
    connection: Connection,
}

impl SqliteRecordStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        create_parent_if_needed(path)?;
        let connection = Connection::open(path).map_err(map_sql_error)?;
        Self::from_connection(connection)
    }

    /// Open the store in the application directory.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = app_dirs::app_root_dir()?.join(RECORDS_DB_FILE_NAME);
        debug!(path = %path.display(), "Opening record store");
        Self::open(path)
    }

    /// Store that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(map_sql_error)?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, StoreError> {
        schema::apply_pragmas(&connection)?;
        schema::apply_schema(&connection)?;
        Ok(Self { connection })
    }

    fn ordered_tags(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .connection
            .prepare_cached("SELECT tag FROM file_tags WHERE path = ?1 ORDER BY tag")
            .map_err(map_sql_error)?;
        let tags = stmt
            .query_map(params![path], |row| row.get::<_, String>(0))
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(tags)
    }
}

impl RecordStore for SqliteRecordStore {
    fn save_folder_handle(&self, name: &str, root: &EntryHandle) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT OR REPLACE INTO recent_folders (name, location, last_opened)
                 VALUES (?1, ?2, ?3)",
                params![name, root.to_location_string(), now_millis()],
            )
            .map_err(map_sql_error)?;
        Ok(())
    }

    fn recent_folders(&self) -> Result<Vec<RecentFolder>, StoreError> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT name, location, last_opened FROM recent_folders
                 ORDER BY last_opened DESC, rowid DESC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RecentFolder {
                    name: row.get(0)?,
                    location: row.get(1)?,
                    last_opened: row.get(2)?,
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    fn toggle_project_bookmark(&self, name: &str, root: &EntryHandle) -> Result<bool, StoreError> {
        let removed = self
            .connection
            .execute("DELETE FROM project_bookmarks WHERE name = ?1", params![name])
            .map_err(map_sql_error)?;
        if removed > 0 {
            return Ok(false);
        }
        self.connection
            .execute(
                "INSERT INTO project_bookmarks (name, location, added_at) VALUES (?1, ?2, ?3)",
                params![name, root.to_location_string(), now_millis()],
            )
            .map_err(map_sql_error)?;
        Ok(true)
    }

    fn project_bookmarks(&self) -> Result<Vec<ProjectBookmark>, StoreError> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT name, location, added_at FROM project_bookmarks
                 ORDER BY added_at DESC, rowid DESC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ProjectBookmark {
                    name: row.get(0)?,
                    location: row.get(1)?,
                    added_at: row.get(2)?,
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    fn is_project_bookmarked(&self, name: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .connection
            .query_row(
                "SELECT 1 FROM project_bookmarks WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)?;
        Ok(found.is_some())
    }

    fn toggle_folder_bookmark(&self, root_name: &str, path: &str) -> Result<bool, StoreError> {
        let id = folder_bookmark_id(root_name, path);
        let removed = self
            .connection
            .execute("DELETE FROM folder_bookmarks WHERE id = ?1", params![id])
            .map_err(map_sql_error)?;
        if removed > 0 {
            return Ok(false);
        }
        let name = if path.is_empty() {
            root_name
        } else {
            last_segment(path)
        };
        self.connection
            .execute(
                "INSERT INTO folder_bookmarks (id, root_name, path, name, added_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, root_name, path, name, now_millis()],
            )
            .map_err(map_sql_error)?;
        Ok(true)
    }

    fn folder_bookmarks(&self, root_name: &str) -> Result<Vec<FolderBookmark>, StoreError> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT id, root_name, path, name, added_at FROM folder_bookmarks
                 WHERE root_name = ?1
                 ORDER BY added_at DESC, rowid DESC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![root_name], |row| {
                Ok(FolderBookmark {
                    id: row.get(0)?,
                    root_name: row.get(1)?,
                    path: row.get(2)?,
                    name: row.get(3)?,
                    added_at: row.get(4)?,
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    fn is_folder_bookmarked(&self, root_name: &str, path: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .connection
            .query_row(
                "SELECT 1 FROM folder_bookmarks WHERE id = ?1",
                params![folder_bookmark_id(root_name, path)],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)?;
        Ok(found.is_some())
    }

    fn add_tag(&self, entry: &Entry, tag: &str) -> Result<Vec<String>, StoreError> {
        let path = entry.path.trim();
        if path.is_empty() {
            return Err(StoreError::InvalidPath(entry.path.clone()));
        }
        let tag = tag.trim();
        if tag.is_empty() {
            return self.tags_for_file(path);
        }
        let location = entry.handle.as_ref().map(EntryHandle::to_location_string);
        let file_type = (!entry.file_type.is_none()).then(|| entry.file_type.to_string());
        self.connection
            .execute(
                "INSERT OR IGNORE INTO tagged_files (path, name, file_type, location)
                 VALUES (?1, ?2, ?3, ?4)",
                params![path, entry.name, file_type, location],
            )
            .map_err(map_sql_error)?;
        if location.is_some() {
            self.connection
                .execute(
                    "UPDATE tagged_files SET name = ?2, file_type = ?3, location = ?4
                     WHERE path = ?1 AND location IS NULL",
                    params![path, entry.name, file_type, location],
                )
                .map_err(map_sql_error)?;
        }
        self.connection
            .execute(
                "INSERT OR IGNORE INTO file_tags (path, tag) VALUES (?1, ?2)",
                params![path, tag],
            )
            .map_err(map_sql_error)?;
        self.ordered_tags(path)
    }

    fn remove_tag(&self, path: &str, tag: &str) -> Result<Vec<String>, StoreError> {
        self.connection
            .execute(
                "DELETE FROM file_tags WHERE path = ?1 AND tag = ?2",
                params![path, tag],
            )
            .map_err(map_sql_error)?;
        let remaining = self.ordered_tags(path)?;
        if remaining.is_empty() {
            self.connection
                .execute("DELETE FROM tagged_files WHERE path = ?1", params![path])
                .map_err(map_sql_error)?;
        }
        Ok(remaining)
    }

    fn tags_for_file(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.ordered_tags(path)
    }

    fn all_tags(&self) -> Result<TagIndex, StoreError> {
        let mut files = self
            .connection
            .prepare("SELECT path, name, file_type, location FROM tagged_files ORDER BY path")
            .map_err(map_sql_error)?;
        let mut records = files
            .query_map([], |row| {
                Ok(TagRecord {
                    path: row.get(0)?,
                    tags: BTreeSet::new(),
                    name: row.get(1)?,
                    file_type: row
                        .get::<_, Option<String>>(2)?
                        .map(|ty| FileType::from_extension(&ty)),
                    handle: row.get(3)?,
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        for record in &mut records {
            record.tags = self.ordered_tags(&record.path)?.into_iter().collect();
        }
        records.retain(|record| !record.tags.is_empty());
        Ok(TagIndex::new(records))
    }

    fn save_recent_file(&self, entry: &Entry, limit: usize) -> Result<(), StoreError> {
        if entry.path.trim().is_empty() {
            return Err(StoreError::InvalidPath(entry.path.clone()));
        }
        self.connection
            .execute(
                "INSERT OR REPLACE INTO recent_files (path, name, file_type, location, last_opened)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.path,
                    entry.name,
                    entry.file_type.as_str(),
                    entry.handle.as_ref().map(EntryHandle::to_location_string),
                    now_millis()
                ],
            )
            .map_err(map_sql_error)?;
        let pruned = self
            .connection
            .execute(
                "DELETE FROM recent_files WHERE path NOT IN (
                    SELECT path FROM recent_files
                    ORDER BY last_opened DESC, rowid DESC
                    LIMIT ?1
                 )",
                params![limit as i64],
            )
            .map_err(map_sql_error)?;
        if pruned > 0 {
            debug!(pruned, "Pruned recent files");
        }
        Ok(())
    }

    fn recent_files(&self) -> Result<Vec<RecentFile>, StoreError> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT path, name, file_type, location, last_opened FROM recent_files
                 ORDER BY last_opened DESC, rowid DESC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], |row| {
                let file_type: String = row.get(2)?;
                Ok(RecentFile {
                    path: row.get(0)?,
                    name: row.get(1)?,
                    file_type: if file_type.is_empty() {
                        FileType::none()
                    } else {
                        FileType::from_extension(&file_type)
                    },
                    location: row.get(3)?,
                    last_opened: row.get(4)?,
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }
}
