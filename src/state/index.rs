//! The media index seam
//!
//! Everything above this trait (grouping, sessions, the CLI) talks to the
//! index only through these calls, so the SQLite catalog can be swapped for
//! another store.

use super::data::{MediaKind, MediaRecord};
use super::grouping::SortKey;
use crate::errors::GalleryResult;

/// Which side of the trash a query looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashFilter {
    /// Regular gallery, trashed records hidden
    Exclude,
    /// Trash view
    Only,
    /// Everything
    Include,
}

/// A query against the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    /// Restrict to one collection, or None for images and videos
    pub kind: Option<MediaKind>,
    pub trash: TrashFilter,
    pub sort: SortKey,
}

impl MediaQuery {
    /// All images and videos outside the trash, newest first
    pub fn gallery() -> Self {
        Self {
            kind: None,
            trash: TrashFilter::Exclude,
            sort: SortKey::AddedDesc,
        }
    }

    /// Everything currently in the trash, newest first
    pub fn trash() -> Self {
        Self {
            kind: None,
            trash: TrashFilter::Only,
            sort: SortKey::AddedDesc,
        }
    }

    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Queryable store of photo/video metadata
///
/// Mutations return the number of affected rows. A return of 0 means the
/// locator no longer names a record.
pub trait MediaIndex: Send + Sync {
    fn query(&self, query: &MediaQuery) -> GalleryResult<Vec<MediaRecord>>;

    fn find(&self, uri: &str) -> GalleryResult<Option<MediaRecord>>;

    /// Move a record into the trash (`Some(timestamp)`) or back out (`None`)
    fn update_trashed(&self, uri: &str, trashed_at: Option<i64>) -> GalleryResult<usize>;

    /// Remove a record permanently
    fn delete(&self, uri: &str) -> GalleryResult<usize>;
}
