//! Folder import
//!
//! Walks a folder and adds every photo and video it finds to the media
//! index. This is how the index gets populated on a desktop, where there is
//! no platform media store to query.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::GalleryResult;
use crate::state::data::MediaKind;
use crate::state::library::{is_duplicate, Library, NewMedia};

/// Image extensions recognised by the scanner (lowercase)
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "heif", "webp", "gif", "dng"];

/// Video extensions recognised by the scanner (lowercase)
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "3gp"];

/// Result of a folder import operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
}

/// Classify a file by extension
pub fn media_kind_for(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Folder of `file` relative to the parent of `root`, with a trailing '/'
///
/// Importing `/home/me/DCIM` files `/home/me/DCIM/Camera/a.jpg` under
/// "DCIM/Camera/".
pub fn relative_folder(root: &Path, file: &Path) -> Option<String> {
    let base = root.parent().unwrap_or(root);
    let folder = file.parent()?.strip_prefix(base).ok()?;
    let parts: Vec<String> = folder
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("{}/", parts.join("/")))
}

/// Import all media files from a folder on a blocking worker thread
pub async fn import_folder(library: Arc<Library>, folder: PathBuf) -> GalleryResult<ImportResult> {
    tokio::task::spawn_blocking(move || import_folder_blocking(&library, &folder)).await?
}

/// Blocking implementation of the folder import
///
/// The folder is resolved to an absolute path first, so the same files
/// reached through different spellings are stored once.
pub fn import_folder_blocking(library: &Library, folder: &Path) -> GalleryResult<ImportResult> {
    let folder = std::fs::canonicalize(folder)?;
    let folder = folder.as_path();
    let mut result = ImportResult::default();
    let now = Utc::now().timestamp();

    info!(folder = %folder.display(), "Scanning folder");

    // Walk the directory tree recursively
    for entry in WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Only process files (not directories)
        if !path.is_file() {
            continue;
        }

        let Some(kind) = media_kind_for(path) else {
            continue;
        };

        let path_str = path.to_string_lossy().to_string();
        let filename = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let size_bytes = entry.metadata().ok().map(|m| m.len() as i64);

        let media = NewMedia {
            path: path_str,
            filename,
            kind,
            // No container parsing here; durations are filled by whoever knows them
            duration_ms: 0,
            relative_path: relative_folder(folder, path),
            size_bytes,
            date_added: now,
        };

        match library.insert_media(&media) {
            Ok(_) => {
                result.imported_count += 1;
                if result.imported_count % 100 == 0 {
                    debug!(imported = result.imported_count, "Import progress");
                }
            }
            Err(err) if is_duplicate(&err) => result.skipped_count += 1,
            Err(err) => {
                warn!(file = %media.filename, error = %err, "Failed to import");
                result.failed_count += 1;
            }
        }
    }

    info!(
        imported = result.imported_count,
        skipped = result.skipped_count,
        failed = result.failed_count,
        "Import complete"
    );

    Ok(result)
}
