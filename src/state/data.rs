//! Shared data structures for the gallery state
//!
//! These types flow between the media index, the grouping stage and
//! whatever surface renders the list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Seconds in one day, used for trash retention math
pub(crate) const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Kind of a media record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Name stored in the `kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(format!("unknown media kind: {}", other)),
        }
    }
}

/// Represents a single photo or video in the media index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Unique index ID
    pub id: i64,
    /// Content locator (e.g., "file:///home/me/Pictures/DCIM/Camera/IMG_0001.jpg")
    pub uri: String,
    /// Filename only (e.g., "IMG_0001.jpg")
    pub name: String,
    /// Image or video
    pub kind: MediaKind,
    /// Playback length in milliseconds, always 0 for images
    pub duration_ms: i64,
    /// Folder relative to the media root (e.g., "DCIM/Camera/"), None if unknown
    pub relative_path: Option<String>,
    /// Unix seconds when the record was added to the index
    pub date_added: i64,
    /// File size on disk, if known
    pub size_bytes: Option<i64>,
    /// Unix seconds when the record was moved to trash
    pub trashed_at: Option<i64>,
}

impl MediaRecord {
    /// Key used by the selection set
    pub fn selection_key(&self) -> &str {
        &self.uri
    }

    pub fn is_trashed(&self) -> bool {
        self.trashed_at.is_some()
    }

    /// Video duration as "MM:SS", or "HH:MM:SS" once it passes an hour
    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration_ms)
    }

    /// File size for display, None when the size is unknown
    pub fn formatted_size(&self) -> Option<String> {
        self.size_bytes.map(format_size)
    }

    /// Whole days left before a trashed record is purged
    ///
    /// Returns None for records that are not in the trash and 0 once the
    /// retention window has passed.
    pub fn remaining_trash_days(&self, now: i64, retention_days: u32) -> Option<i64> {
        let trashed_at = self.trashed_at?;
        let expires_at = trashed_at + i64::from(retention_days) * SECS_PER_DAY;
        if expires_at <= now {
            return Some(0);
        }
        Some((expires_at - now) / SECS_PER_DAY)
    }
}

// Timestamps, size and display name do not take part in identity.
impl PartialEq for MediaRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.uri == other.uri
            && self.kind == other.kind
            && self.duration_ms == other.duration_ms
            && self.relative_path == other.relative_path
    }
}

impl Eq for MediaRecord {}

impl Hash for MediaRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.uri.hash(state);
        self.kind.hash(state);
        self.duration_ms.hash(state);
        self.relative_path.hash(state);
    }
}

/// Format a millisecond duration for display
pub fn format_duration(millis: i64) -> String {
    let total_secs = millis.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Format a byte count as B below 1 KiB, then KB, then MB
pub fn format_size(bytes: i64) -> String {
    const KIB: i64 = 1024;
    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < KIB * KIB {
        format!("{:.2} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / (KIB * KIB) as f64)
    }
}

/// One row of a grouped list: a section header or a media entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DisplayItem {
    Header { title: String },
    Entry { record: MediaRecord },
}

impl DisplayItem {
    pub fn header(title: impl Into<String>) -> Self {
        DisplayItem::Header { title: title.into() }
    }

    pub fn entry(record: MediaRecord) -> Self {
        DisplayItem::Entry { record }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, DisplayItem::Header { .. })
    }

    pub fn record(&self) -> Option<&MediaRecord> {
        match self {
            DisplayItem::Entry { record } => Some(record),
            DisplayItem::Header { .. } => None,
        }
    }

    /// Whether two items represent the same row
    ///
    /// Headers match on title, entries match on record ID.
    pub fn same_item(&self, other: &DisplayItem) -> bool {
        match (self, other) {
            (DisplayItem::Header { title: a }, DisplayItem::Header { title: b }) => a == b,
            (DisplayItem::Entry { record: a }, DisplayItem::Entry { record: b }) => a.id == b.id,
            _ => false,
        }
    }

    /// Whether a row that is the same item also renders identically
    pub fn same_content(&self, other: &DisplayItem) -> bool {
        self == other
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(id: i64, folder: &str, date_added: i64) -> MediaRecord {
        MediaRecord {
            id,
            uri: format!("file:///media/{}/{}.jpg", folder, id),
            name: format!("{}.jpg", id),
            kind: MediaKind::Image,
            duration_ms: 0,
            relative_path: Some(format!("{}/", folder)),
            date_added,
            size_bytes: None,
            trashed_at: None,
        }
    }

    #[test]
    fn test_equality_ignores_timestamp_and_name() {
        let a = record(1, "DCIM", 100);
        let mut b = a.clone();
        b.date_added = 999;
        b.name = "renamed.jpg".to_string();
        assert_eq!(a, b);

        b.relative_path = Some("Pictures/".to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(65_000), "01:05");
        assert_eq!(format_duration(3_723_000), "01:02:03");
    }

    #[test]
    fn test_format_size_thresholds() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1024 * 1024 - 1), "1024.00 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024 + 256 * 1024), "5.25 MB");
    }

    #[test]
    fn test_formatted_size_needs_a_size() {
        let mut r = record(1, "DCIM", 0);
        assert_eq!(r.formatted_size(), None);
        r.size_bytes = Some(2048);
        assert_eq!(r.formatted_size().as_deref(), Some("2.00 KB"));
    }

    #[test]
    fn test_remaining_trash_days() {
        let mut r = record(1, "DCIM", 0);
        assert_eq!(r.remaining_trash_days(0, 30), None);

        r.trashed_at = Some(0);
        assert_eq!(r.remaining_trash_days(0, 30), Some(30));
        assert_eq!(r.remaining_trash_days(SECS_PER_DAY * 29 + 1, 30), Some(0));
        assert_eq!(r.remaining_trash_days(SECS_PER_DAY * 31, 30), Some(0));
    }

    #[test]
    fn test_same_item_vs_same_content() {
        let a = DisplayItem::entry(record(7, "DCIM", 0));
        let mut moved = record(7, "DCIM", 0);
        moved.relative_path = Some("Pictures/".to_string());
        let b = DisplayItem::entry(moved);

        assert!(a.same_item(&b));
        assert!(!a.same_content(&b));
        assert!(!a.same_item(&DisplayItem::header("DCIM")));
        assert!(DisplayItem::header("x").same_item(&DisplayItem::header("x")));
    }

    #[test]
    fn test_kind_round_trip() {
        assert_eq!("video".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert!("audio".parse::<MediaKind>().is_err());
    }
}
