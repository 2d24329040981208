use rusqlite::Connection;

use super::StoreError;
use super::util::map_sql_error;

pub(super) fn apply_pragmas(connection: &Connection) -> Result<(), StoreError> {
    connection
        .execute_batch(
            "PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;",
        )
        .map_err(map_sql_error)
}

pub(super) fn apply_schema(connection: &Connection) -> Result<(), StoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS recent_folders (
                name TEXT PRIMARY KEY,
                location TEXT NOT NULL,
                last_opened INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS project_bookmarks (
                name TEXT PRIMARY KEY,
                location TEXT NOT NULL,
                added_at INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS folder_bookmarks (
                id TEXT PRIMARY KEY,
                root_name TEXT NOT NULL,
                path TEXT NOT NULL,
                name TEXT NOT NULL,
                added_at INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_folder_bookmarks_root
                ON folder_bookmarks (root_name, added_at);
             CREATE TABLE IF NOT EXISTS tagged_files (
                path TEXT PRIMARY KEY,
                name TEXT,
                file_type TEXT,
                location TEXT
             );
             CREATE TABLE IF NOT EXISTS file_tags (
                path TEXT NOT NULL,
                tag TEXT NOT NULL,
                PRIMARY KEY (path, tag),
                FOREIGN KEY(path) REFERENCES tagged_files(path) ON DELETE CASCADE
             );
             CREATE TABLE IF NOT EXISTS recent_files (
                path TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                file_type TEXT NOT NULL,
                location TEXT,
                last_opened INTEGER NOT NULL
             );",
        )
        .map_err(map_sql_error)
}
