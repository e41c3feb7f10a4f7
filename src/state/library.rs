use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::data::{MediaKind, MediaRecord, SECS_PER_DAY};
use super::grouping::SortKey;
use super::index::{MediaIndex, MediaQuery, TrashFilter};
use crate::errors::{GalleryError, GalleryResult};

/// Scheme prefix of every locator handed out by the library
const URI_SCHEME: &str = "file://";

/// Columns read into a MediaRecord, in order
const RECORD_COLUMNS: &str =
    "id, path, filename, kind, duration_ms, relative_path, date_added, size_bytes, trashed_at";

/// A file about to be added to the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedia {
    pub path: String,
    pub filename: String,
    pub kind: MediaKind,
    pub duration_ms: i64,
    pub relative_path: Option<String>,
    pub size_bytes: Option<i64>,
    pub date_added: i64,
}

/// The Library manages the SQLite media index.
/// It stores one row per photo or video along with its trash state.
///
/// The connection sits behind a mutex so a single Library can be shared
/// with the background loader.
pub struct Library {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open (or create) the index at `db_path` and initialize the schema.
    pub fn open(db_path: &Path) -> GalleryResult<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        info!(path = %db_path.display(), "Media index opened");

        let library = Library {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// Open a throwaway index that lives only in memory
    pub fn open_in_memory() -> GalleryResult<Self> {
        let library = Library {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    fn conn(&self) -> GalleryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| GalleryError::Worker("media index lock poisoned".to_string()))
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&self) -> GalleryResult<()> {
        let conn = self.conn()?;

        // file_status is 'exists' or 'missing' (file vanished from disk)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS media (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                path            TEXT NOT NULL UNIQUE,
                filename        TEXT NOT NULL,
                kind            TEXT NOT NULL,
                duration_ms     INTEGER NOT NULL DEFAULT 0,
                relative_path   TEXT,
                size_bytes      INTEGER,
                date_added      INTEGER NOT NULL,
                is_trashed      INTEGER NOT NULL DEFAULT 0,
                trashed_at      INTEGER,
                file_status     TEXT NOT NULL DEFAULT 'exists'
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_media_date_added
             ON media(date_added DESC)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_media_trashed
             ON media(is_trashed)",
            [],
        )?;

        debug!("Media index schema initialized");
        Ok(())
    }

    /// Get the path to the database file (None for in-memory indexes)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Count of visible records, trashed ones included
    pub fn media_count(&self) -> GalleryResult<i64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM media WHERE file_status = 'exists'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Add a new file to the index
    /// Returns the new record ID
    ///
    /// Inserting a path that is already indexed fails with a constraint
    /// violation; see [`is_duplicate`].
    pub fn insert_media(&self, media: &NewMedia) -> GalleryResult<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO media (path, filename, kind, duration_ms, relative_path, size_bytes, date_added)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                media.path,
                media.filename,
                media.kind.as_str(),
                media.duration_ms,
                media.relative_path,
                media.size_bytes,
                media.date_added,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Look up a visible record by index ID, trashed or not
    pub fn find_by_id(&self, id: i64) -> GalleryResult<Option<MediaRecord>> {
        let sql = format!(
            "SELECT {} FROM media WHERE id = ?1 AND file_status = 'exists'",
            RECORD_COLUMNS
        );
        let record = self
            .conn()?
            .query_row(&sql, [id], record_from_row)
            .optional()?;
        Ok(record)
    }

    /// Permanently delete trashed records whose retention window has passed
    pub fn purge_expired(&self, now: i64, retention_days: u32) -> GalleryResult<usize> {
        let cutoff = now - i64::from(retention_days) * SECS_PER_DAY;
        let purged = self.conn()?.execute(
            "DELETE FROM media WHERE is_trashed = 1 AND trashed_at <= ?1",
            rusqlite::params![cutoff],
        )?;

        if purged > 0 {
            info!(purged, "Purged expired trash");
        }
        Ok(purged)
    }

    /// Verify that media files still exist on disk
    /// Mark as 'missing' if the file is gone, which hides it from queries
    pub fn verify_files(&self) -> GalleryResult<usize> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, path FROM media WHERE file_status = 'exists'")?;

        let existing: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;

        let mut missing_count = 0;
        for (id, file_path) in existing {
            if !Path::new(&file_path).exists() {
                conn.execute(
                    "UPDATE media SET file_status = 'missing' WHERE id = ?1",
                    rusqlite::params![id],
                )?;
                missing_count += 1;
            }
        }

        if missing_count > 0 {
            warn!(missing_count, "Marked missing files");
        }

        Ok(missing_count)
    }
}

impl MediaIndex for Library {
    fn query(&self, query: &MediaQuery) -> GalleryResult<Vec<MediaRecord>> {
        let order = match query.sort {
            SortKey::IdDesc => "id DESC",
            SortKey::AddedDesc => "date_added DESC, id DESC",
        };
        let trashed: Option<i64> = match query.trash {
            TrashFilter::Exclude => Some(0),
            TrashFilter::Only => Some(1),
            TrashFilter::Include => None,
        };
        let sql = format!(
            "SELECT {} FROM media
             WHERE file_status = 'exists'
               AND (?1 IS NULL OR kind = ?1)
               AND (?2 IS NULL OR is_trashed = ?2)
             ORDER BY {}",
            RECORD_COLUMNS, order
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(
                rusqlite::params![query.kind.map(|k| k.as_str()), trashed],
                record_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = records.len(), ?query, "Media query");
        Ok(records)
    }

    fn find(&self, uri: &str) -> GalleryResult<Option<MediaRecord>> {
        let Some(path) = uri_to_path(uri) else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT {} FROM media WHERE path = ?1 AND file_status = 'exists'",
            RECORD_COLUMNS
        );
        let record = self
            .conn()?
            .query_row(&sql, [path], record_from_row)
            .optional()?;
        Ok(record)
    }

    fn update_trashed(&self, uri: &str, trashed_at: Option<i64>) -> GalleryResult<usize> {
        let Some(path) = uri_to_path(uri) else {
            return Ok(0);
        };
        let updated = self.conn()?.execute(
            "UPDATE media SET is_trashed = ?1, trashed_at = ?2
             WHERE path = ?3 AND file_status = 'exists'",
            rusqlite::params![trashed_at.is_some(), trashed_at, path],
        )?;
        Ok(updated)
    }

    fn delete(&self, uri: &str) -> GalleryResult<usize> {
        let Some(path) = uri_to_path(uri) else {
            return Ok(0);
        };
        let deleted = self
            .conn()?
            .execute("DELETE FROM media WHERE path = ?1", [path])?;
        Ok(deleted)
    }
}

/// Build the locator for an indexed path
pub fn path_to_uri(path: &str) -> String {
    format!("{}{}", URI_SCHEME, path)
}

/// Reverse of [`path_to_uri`]; None for foreign locators
pub fn uri_to_path(uri: &str) -> Option<&str> {
    uri.strip_prefix(URI_SCHEME)
}

/// Check whether an insert failed because the path is already indexed
pub fn is_duplicate(err: &GalleryError) -> bool {
    matches!(
        err,
        GalleryError::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MediaRecord> {
    let path: String = row.get(1)?;
    let kind: String = row.get(3)?;
    let kind = kind
        .parse::<MediaKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;

    Ok(MediaRecord {
        id: row.get(0)?,
        uri: path_to_uri(&path),
        name: row.get(2)?,
        kind,
        duration_ms: row.get(4)?,
        relative_path: row.get(5)?,
        date_added: row.get(6)?,
        size_bytes: row.get(7)?,
        trashed_at: row.get(8)?,
    })
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_media(path: &str, kind: MediaKind, date_added: i64) -> NewMedia {
        NewMedia {
            path: path.to_string(),
            filename: path.rsplit('/').next().unwrap_or(path).to_string(),
            kind,
            duration_ms: if kind == MediaKind::Video { 12_000 } else { 0 },
            relative_path: Some("DCIM/Camera/".to_string()),
            size_bytes: Some(1024),
            date_added,
        }
    }

    #[test]
    fn test_insert_and_query_order() {
        let lib = Library::open_in_memory().unwrap();
        lib.insert_media(&new_media("/m/a.jpg", MediaKind::Image, 100)).unwrap();
        lib.insert_media(&new_media("/m/b.mp4", MediaKind::Video, 300)).unwrap();
        lib.insert_media(&new_media("/m/c.jpg", MediaKind::Image, 200)).unwrap();

        let all = lib.query(&MediaQuery::gallery()).unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b.mp4", "c.jpg", "a.jpg"]);
        assert_eq!(all[0].duration_ms, 12_000);
        assert_eq!(all[0].uri, "file:///m/b.mp4");

        let videos = lib
            .query(&MediaQuery::gallery().with_kind(MediaKind::Video))
            .unwrap();
        assert_eq!(videos.len(), 1);

        let by_id = lib
            .query(&MediaQuery {
                sort: SortKey::IdDesc,
                ..MediaQuery::gallery()
            })
            .unwrap();
        assert_eq!(by_id[0].name, "c.jpg");
    }

    #[test]
    fn test_duplicate_path_is_detected() {
        let lib = Library::open_in_memory().unwrap();
        lib.insert_media(&new_media("/m/a.jpg", MediaKind::Image, 1)).unwrap();
        let err = lib
            .insert_media(&new_media("/m/a.jpg", MediaKind::Image, 2))
            .unwrap_err();
        assert!(is_duplicate(&err));
        assert_eq!(lib.media_count().unwrap(), 1);
    }

    #[test]
    fn test_trash_and_restore() {
        let lib = Library::open_in_memory().unwrap();
        lib.insert_media(&new_media("/m/a.jpg", MediaKind::Image, 1)).unwrap();
        let uri = path_to_uri("/m/a.jpg");

        assert_eq!(lib.update_trashed(&uri, Some(50)).unwrap(), 1);
        assert!(lib.query(&MediaQuery::gallery()).unwrap().is_empty());
        let trashed = lib.query(&MediaQuery::trash()).unwrap();
        assert_eq!(trashed.len(), 1);
        assert_eq!(trashed[0].trashed_at, Some(50));

        assert_eq!(lib.update_trashed(&uri, None).unwrap(), 1);
        assert!(lib.query(&MediaQuery::trash()).unwrap().is_empty());
        assert!(lib.find(&uri).unwrap().unwrap().trashed_at.is_none());
    }

    #[test]
    fn test_find_by_id_sees_trashed_records() {
        let lib = Library::open_in_memory().unwrap();
        let id = lib.insert_media(&new_media("/m/a.jpg", MediaKind::Image, 1)).unwrap();
        lib.update_trashed(&path_to_uri("/m/a.jpg"), Some(5)).unwrap();

        let record = lib.find_by_id(id).unwrap().unwrap();
        assert_eq!(record.name, "a.jpg");
        assert_eq!(record.size_bytes, Some(1024));
        assert_eq!(record.trashed_at, Some(5));
        assert!(lib.find_by_id(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_missing_locator_affects_nothing() {
        let lib = Library::open_in_memory().unwrap();
        assert_eq!(lib.delete("file:///nope.jpg").unwrap(), 0);
        assert_eq!(lib.update_trashed("content://x/1", Some(1)).unwrap(), 0);
        assert!(lib.find("file:///nope.jpg").unwrap().is_none());
    }

    #[test]
    fn test_purge_expired() {
        let lib = Library::open_in_memory().unwrap();
        lib.insert_media(&new_media("/m/old.jpg", MediaKind::Image, 1)).unwrap();
        lib.insert_media(&new_media("/m/new.jpg", MediaKind::Image, 1)).unwrap();
        lib.update_trashed(&path_to_uri("/m/old.jpg"), Some(0)).unwrap();
        lib.update_trashed(&path_to_uri("/m/new.jpg"), Some(25 * SECS_PER_DAY)).unwrap();

        let purged = lib.purge_expired(31 * SECS_PER_DAY, 30).unwrap();
        assert_eq!(purged, 1);
        assert_eq!(lib.media_count().unwrap(), 1);
    }

    #[test]
    fn test_verify_files_hides_missing() {
        let lib = Library::open_in_memory().unwrap();
        lib.insert_media(&new_media("/definitely/not/here.jpg", MediaKind::Image, 1))
            .unwrap();
        assert_eq!(lib.verify_files().unwrap(), 1);
        assert_eq!(lib.media_count().unwrap(), 0);
        assert!(lib.query(&MediaQuery::gallery()).unwrap().is_empty());
    }
}
