//! CLI commands
//!
//! The terminal is the rendering surface here: it prints the grouped list
//! and drives a view session for the bulk commands.

use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::warn;

use shutterframe::import::import_folder;
use shutterframe::session::{BulkAction, Confirmation, LoadEvent, NoticeLevel, ViewKind, ViewSession};
use shutterframe::state::grouping::{GroupingPlan, UNKNOWN_FOLDER};
use shutterframe::state::{DisplayItem, Library, MediaKind, MediaRecord};
use shutterframe::{Config, GalleryError, GalleryResult};

use crate::GroupArg;

/// Bulk commands and the view each one runs in
#[derive(Debug, Clone, Copy)]
pub enum BulkCommand {
    Trash,
    Restore,
    Delete,
}

impl BulkCommand {
    fn view(self) -> ViewKind {
        match self {
            BulkCommand::Trash => ViewKind::Gallery,
            BulkCommand::Restore | BulkCommand::Delete => ViewKind::Trash,
        }
    }

    fn action(self) -> BulkAction {
        match self {
            BulkCommand::Trash => BulkAction::Trash,
            BulkCommand::Restore => BulkAction::Restore,
            BulkCommand::Delete => BulkAction::Delete,
        }
    }
}

fn open_library(config: &Config) -> GalleryResult<Arc<Library>> {
    Ok(Arc::new(Library::open(&config.database_path)?))
}

/// Import a folder into the index
pub async fn import(config: &Config, folder: PathBuf) -> GalleryResult<()> {
    let library = open_library(config)?;
    println!("Importing from {}...", folder.display());

    let result = import_folder(Arc::clone(&library), folder).await?;
    println!(
        "✅ Import complete! Added {} items, skipped {} duplicates.",
        result.imported_count, result.skipped_count
    );
    if result.failed_count > 0 {
        println!("⚠️  {} files could not be imported.", result.failed_count);
    }
    Ok(())
}

/// Print the gallery or the trash
pub async fn list(
    config: &Config,
    trash: bool,
    group: Option<GroupArg>,
    json: bool,
) -> GalleryResult<()> {
    let library = open_library(config)?;
    let kind = if trash { ViewKind::Trash } else { ViewKind::Gallery };

    let mut session = ViewSession::new(kind, library, Handle::current());
    if let Some(group) = group {
        let plan = match group {
            GroupArg::Folder => GroupingPlan::by_folder(),
            GroupArg::Date => GroupingPlan::by_date(),
        };
        session = session.with_grouping(plan);
    }

    if let Some(LoadEvent::Failed { notice, .. }) = session.load().await {
        eprintln!("{}", notice.message);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(session.items())?);
    } else if session.items().is_empty() {
        println!("{}", if trash { "Trash is empty." } else { "No photos or videos." });
    } else {
        render(&session, config.trash_retention_days);
    }

    session.shutdown().await;
    Ok(())
}

fn render(session: &ViewSession, retention_days: u32) {
    let now = Utc::now().timestamp();
    for item in session.items() {
        match item {
            DisplayItem::Header { title } => println!("\n== {} ==", title),
            DisplayItem::Entry { record } => {
                let mut line = format!("  [{:>5}] {}", record.id, record.name);
                if record.kind == MediaKind::Video {
                    line.push_str(&format!("  ▶ {}", record.formatted_duration()));
                }
                if let Some(days) = record.remaining_trash_days(now, retention_days) {
                    line.push_str(&format!("  ({} days left)", days));
                }
                if session.selection().is_selected(record) {
                    line.push_str("  [x]");
                }
                println!("{}", line);
            }
        }
    }
}

/// Print the details of one record, trashed or not
pub fn info(config: &Config, id: i64) -> GalleryResult<()> {
    let library = open_library(config)?;
    let record = library
        .find_by_id(id)?
        .ok_or_else(|| GalleryError::NotFound(format!("id {}", id)))?;

    for (label, value) in info_lines(&record, Utc::now().timestamp(), config.trash_retention_days) {
        println!("{:<12} {}", format!("{}:", label), value);
    }
    Ok(())
}

fn info_lines(record: &MediaRecord, now: i64, retention_days: u32) -> Vec<(&'static str, String)> {
    let added = DateTime::from_timestamp(record.date_added, 0)
        .map(|utc| utc.with_timezone(&Local).format("%a, %d %b %Y • %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut lines = vec![
        ("Name", record.name.clone()),
        ("Kind", record.kind.to_string()),
    ];
    if record.kind == MediaKind::Video {
        lines.push(("Duration", record.formatted_duration()));
    }
    lines.push(("Added", added));
    lines.push((
        "Size",
        record.formatted_size().unwrap_or_else(|| "unknown".to_string()),
    ));
    lines.push((
        "Folder",
        record.relative_path.clone().unwrap_or_else(|| UNKNOWN_FOLDER.to_string()),
    ));
    lines.push(("Location", record.uri.clone()));
    if let Some(days) = record.remaining_trash_days(now, retention_days) {
        lines.push(("In trash", format!("{} days left", days)));
    }
    lines
}

/// Select `ids` in a view session and run a bulk action on them
pub async fn bulk(
    config: &Config,
    command: BulkCommand,
    ids: &[i64],
    confirmed: bool,
) -> GalleryResult<()> {
    let library = open_library(config)?;
    let mut session = ViewSession::new(command.view(), library, Handle::current());
    session.load().await;

    for id in session.select_ids(ids) {
        warn!(id, "Not listed in this view");
        println!("No item {} here.", id);
    }

    let Some(request) = session.begin_bulk(command.action()) else {
        println!("Nothing selected.");
        session.shutdown().await;
        return Ok(());
    };

    let confirmation = if confirmed {
        Confirmation::Granted
    } else {
        println!(
            "Refusing to delete {} items permanently without --yes.",
            request.len()
        );
        Confirmation::Denied
    };

    let outcome = session.complete_bulk(request, confirmation).await;
    match outcome.notice.level {
        NoticeLevel::Info => println!("✅ {}", outcome.notice.message),
        NoticeLevel::Error => println!("⚠️  {}", outcome.notice.message),
    }

    // Let the follow-up reload land before closing
    session.next_load().await;
    session.shutdown().await;
    Ok(())
}

/// Drop expired trash
pub fn purge(config: &Config) -> GalleryResult<()> {
    let library = open_library(config)?;
    let purged = library.purge_expired(Utc::now().timestamp(), config.trash_retention_days)?;
    println!("🗑️  Purged {} expired items.", purged);
    Ok(())
}

/// Check indexed files still exist
pub fn verify(config: &Config) -> GalleryResult<()> {
    let library = open_library(config)?;
    let missing = library.verify_files()?;
    println!(
        "Checked {} items, {} missing.",
        library.media_count()? + missing as i64,
        missing
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> MediaRecord {
        MediaRecord {
            id: 4,
            uri: "file:///m/DCIM/Camera/v.mp4".to_string(),
            name: "v.mp4".to_string(),
            kind: MediaKind::Video,
            duration_ms: 75_000,
            relative_path: Some("DCIM/Camera/".to_string()),
            date_added: 1_750_000_000,
            size_bytes: Some(3 * 1024 * 1024),
            trashed_at: None,
        }
    }

    fn value<'a>(lines: &'a [(&'static str, String)], label: &str) -> Option<&'a str> {
        lines.iter().find(|(l, _)| *l == label).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_info_lines_for_video() {
        let lines = info_lines(&video(), 0, 30);
        assert_eq!(value(&lines, "Name"), Some("v.mp4"));
        assert_eq!(value(&lines, "Kind"), Some("video"));
        assert_eq!(value(&lines, "Duration"), Some("01:15"));
        assert_eq!(value(&lines, "Size"), Some("3.00 MB"));
        assert_eq!(value(&lines, "Folder"), Some("DCIM/Camera/"));
        assert_eq!(value(&lines, "In trash"), None);
    }

    #[test]
    fn test_info_lines_for_trashed_image_without_size() {
        let mut record = video();
        record.kind = MediaKind::Image;
        record.duration_ms = 0;
        record.size_bytes = None;
        record.relative_path = None;
        record.trashed_at = Some(0);

        let lines = info_lines(&record, 0, 30);
        assert_eq!(value(&lines, "Duration"), None);
        assert_eq!(value(&lines, "Size"), Some("unknown"));
        assert_eq!(value(&lines, "Folder"), Some(UNKNOWN_FOLDER));
        assert_eq!(value(&lines, "In trash"), Some("30 days left"));
    }
}
