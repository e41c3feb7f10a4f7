//! View sessions
//!
//! A [`ViewSession`] owns everything one list view needs: the rows on
//! screen, the selection state and the handles of its background loads.
//! Loads run on tokio's blocking pool and report back over a channel; the
//! session applies them on the caller's context.
//!
//! Loads are never cancelled. If two overlap, whichever *finishes* last
//! decides what is on screen.

use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{GalleryError, GalleryResult};
use crate::state::data::{DisplayItem, MediaRecord};
use crate::state::diff::{diff, EditOp};
use crate::state::grouping::{build_display_list, DateContext, GroupingPlan};
use crate::state::index::{MediaIndex, MediaQuery};
use crate::state::selection::{Selection, SelectionMode, TapOutcome};

/// Which list a session shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Everything outside the trash, grouped by folder
    Gallery,
    /// Trashed items, grouped by the day they were added
    Trash,
}

impl ViewKind {
    pub fn query(&self) -> MediaQuery {
        match self {
            ViewKind::Gallery => MediaQuery::gallery(),
            ViewKind::Trash => MediaQuery::trash(),
        }
    }

    pub fn grouping(&self) -> GroupingPlan {
        match self {
            ViewKind::Gallery => GroupingPlan::by_folder(),
            ViewKind::Trash => GroupingPlan::by_date(),
        }
    }
}

/// Where a session gets "today" from when bucketing by date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Local,
    Fixed(DateContext),
}

impl DateSource {
    fn resolve(&self) -> DateContext {
        match self {
            DateSource::Local => DateContext::local_now(),
            DateSource::Fixed(ctx) => *ctx,
        }
    }
}

/// Bulk mutations a selection can be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Move into the trash
    Trash,
    /// Move out of the trash
    Restore,
    /// Remove permanently
    Delete,
}

impl BulkAction {
    fn past_tense(&self) -> &'static str {
        match self {
            BulkAction::Trash => "Moved to trash",
            BulkAction::Restore => "Restored",
            BulkAction::Delete => "Deleted",
        }
    }
}

/// Outcome of the confirmation step that gates a bulk request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Granted,
    Denied,
}

/// A bulk action over a snapshot of records, waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    pub action: BulkAction,
    pub records: Vec<MediaRecord>,
}

impl BulkRequest {
    /// Request for a single record, as issued from a detail view
    pub fn single(action: BulkAction, record: MediaRecord) -> Self {
        Self {
            action,
            records: vec![record],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Short user-facing message (a toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(err: &GalleryError) -> Self {
        let message = match err {
            GalleryError::PermissionDenied => "Action cancelled or not permitted.".to_string(),
            other => other.to_string(),
        };
        Self {
            level: NoticeLevel::Error,
            message,
        }
    }
}

/// What a completed bulk action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub notice: Notice,
    pub succeeded: usize,
    pub total: usize,
    /// Generation of the reload started afterwards
    pub reload: u64,
}

/// A finished background load, as applied by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    /// The list was replaced; `ops` turns the previous list into the new one
    Applied { generation: u64, ops: Vec<EditOp> },
    /// The load failed and the list was left as it was
    Failed { generation: u64, notice: Notice },
}

struct Loaded {
    generation: u64,
    result: GalleryResult<Vec<DisplayItem>>,
}

/// One list view: owns its rows, its selection and its worker handles
pub struct ViewSession {
    kind: ViewKind,
    index: Arc<dyn MediaIndex>,
    runtime: Handle,
    dates: DateSource,
    plan: GroupingPlan,
    items: Vec<DisplayItem>,
    selection: Selection,
    next_generation: u64,
    pending_loads: usize,
    tx: mpsc::UnboundedSender<Loaded>,
    rx: mpsc::UnboundedReceiver<Loaded>,
    workers: Vec<JoinHandle<()>>,
}

impl ViewSession {
    pub fn new(kind: ViewKind, index: Arc<dyn MediaIndex>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            kind,
            index,
            runtime,
            dates: DateSource::Local,
            plan: kind.grouping(),
            items: Vec::new(),
            selection: Selection::new(),
            next_generation: 0,
            pending_loads: 0,
            tx,
            rx,
            workers: Vec::new(),
        }
    }

    /// Bucket dates against a fixed day instead of the local clock
    pub fn with_dates(mut self, dates: DateContext) -> Self {
        self.dates = DateSource::Fixed(dates);
        self
    }

    /// Group differently from the view's default layout
    pub fn with_grouping(mut self, plan: GroupingPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    pub fn entries(&self) -> impl Iterator<Item = &MediaRecord> {
        self.items.iter().filter_map(DisplayItem::record)
    }

    pub fn find_entry(&self, id: i64) -> Option<&MediaRecord> {
        self.entries().find(|r| r.id == id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// Number of loads started but not yet applied
    pub fn loads_in_flight(&self) -> usize {
        self.pending_loads
    }

    /// Start a background load and return its generation
    ///
    /// Earlier loads keep running; see the module docs for how overlapping
    /// results are applied.
    pub fn request_load(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;

        let index = Arc::clone(&self.index);
        let query = self.kind.query();
        let plan = self.plan;
        let dates = self.dates.resolve();
        let tx = self.tx.clone();

        self.workers.retain(|h| !h.is_finished());
        self.pending_loads += 1;
        let handle = self.runtime.spawn_blocking(move || {
            // Always report back, even if the query panics
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                index
                    .query(&query)
                    .map(|records| build_display_list(records, plan, &dates))
            }))
            .unwrap_or_else(|_| Err(GalleryError::Worker(format!("load {} panicked", generation))));
            if tx.send(Loaded { generation, result }).is_err() {
                debug!(generation, "Session closed before load finished");
            }
        });
        self.workers.push(handle);

        debug!(generation, kind = ?self.kind, "Load requested");
        generation
    }

    fn apply(&mut self, loaded: Loaded) -> LoadEvent {
        let generation = loaded.generation;
        self.pending_loads = self.pending_loads.saturating_sub(1);
        match loaded.result {
            Ok(items) => {
                let ops = diff(&self.items, &items);
                self.items = items;
                self.selection.retain_listed(&self.items);
                debug!(generation, rows = self.items.len(), changes = ops.len(), "Load applied");
                LoadEvent::Applied { generation, ops }
            }
            Err(err) => {
                warn!(generation, error = %err, "Load failed");
                LoadEvent::Failed {
                    generation,
                    notice: Notice::error(&err),
                }
            }
        }
    }

    /// Apply every load that has finished so far, in completion order
    pub fn apply_completed(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Ok(loaded) = self.rx.try_recv() {
            events.push(self.apply(loaded));
        }
        events
    }

    /// Wait for the next load to finish and apply it
    ///
    /// Returns None if no load is in flight.
    pub async fn next_load(&mut self) -> Option<LoadEvent> {
        if self.pending_loads == 0 {
            return None;
        }
        // Every worker sends exactly once, so this cannot wait forever
        let loaded = self.rx.recv().await?;
        Some(self.apply(loaded))
    }

    /// Start a load and wait for the next one to land
    pub async fn load(&mut self) -> Option<LoadEvent> {
        self.request_load();
        self.next_load().await
    }

    /// Start selecting with nothing selected (the "choose" button)
    pub fn enter_selection(&mut self) {
        self.selection.enter();
    }

    /// Long-press on the entry with `id`; true if it started a selection
    pub fn long_press(&mut self, id: i64) -> bool {
        let Some(record) = self.find_entry(id).cloned() else {
            return false;
        };
        self.selection.long_press(&record)
    }

    /// Tap on the entry with `id`; None if it is not listed
    pub fn tap(&mut self, id: i64) -> Option<TapOutcome> {
        let record = self.find_entry(id).cloned()?;
        Some(self.selection.tap(&record))
    }

    /// Select the listed entries among `ids`, entering selection mode if needed
    ///
    /// Ids are treated as a set: one that is already selected stays selected.
    /// Returns the ids that are not listed in this view.
    pub fn select_ids(&mut self, ids: &[i64]) -> Vec<i64> {
        let mut missing = Vec::new();
        for &id in ids {
            let Some(record) = self.find_entry(id).cloned() else {
                if !missing.contains(&id) {
                    missing.push(id);
                }
                continue;
            };
            if self.selection.is_selected(&record) {
                continue;
            }
            if !self.selection.long_press(&record) {
                self.selection.tap(&record);
            }
        }
        missing
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.items);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn cancel_selection(&mut self) {
        self.selection.cancel();
    }

    pub fn selected_count(&self) -> usize {
        self.selection.count()
    }

    /// Snapshot the current selection for a bulk action
    ///
    /// None while the action is disabled (nothing selected).
    pub fn begin_bulk(&self, action: BulkAction) -> Option<BulkRequest> {
        if !self.selection.actions_enabled() {
            return None;
        }
        let records = self.selection.snapshot(&self.items);
        if records.is_empty() {
            return None;
        }
        Some(BulkRequest { action, records })
    }

    /// Run a confirmed (or denied) bulk request against the index
    ///
    /// Whatever happens, the view goes back to browsing and a reload is
    /// started. Records the index no longer knows count as failures.
    pub async fn complete_bulk(
        &mut self,
        request: BulkRequest,
        confirmation: Confirmation,
    ) -> BulkOutcome {
        let total = request.len();
        let action = request.action;

        let (succeeded, notice) = match confirmation {
            Confirmation::Denied => {
                info!(?action, total, "Bulk request denied");
                (0, Notice::error(&GalleryError::PermissionDenied))
            }
            Confirmation::Granted => match self.run_bulk(request).await {
                Ok(succeeded) => (succeeded, bulk_notice(action, succeeded, total)),
                Err((succeeded, err)) => (succeeded, Notice::error(&err)),
            },
        };

        self.selection.cancel();
        let reload = self.request_load();

        BulkOutcome {
            notice,
            succeeded,
            total,
            reload,
        }
    }

    async fn run_bulk(&self, request: BulkRequest) -> Result<usize, (usize, GalleryError)> {
        let index = Arc::clone(&self.index);
        let now = Utc::now().timestamp();

        let worker = self.runtime.spawn_blocking(move || {
            let mut succeeded = 0;
            for record in &request.records {
                let affected = match request.action {
                    BulkAction::Trash => index.update_trashed(&record.uri, Some(now)),
                    BulkAction::Restore => index.update_trashed(&record.uri, None),
                    BulkAction::Delete => index.delete(&record.uri),
                };
                match affected {
                    Ok(0) => warn!(uri = %record.uri, "Media vanished before bulk action"),
                    Ok(_) => succeeded += 1,
                    // Keep going; the partial count is what gets reported
                    Err(err) => warn!(uri = %record.uri, error = %err, "Bulk action failed"),
                }
            }
            (succeeded, request)
        });

        let (succeeded, request) = worker
            .await
            .map_err(|e| (0usize, GalleryError::from(e)))?;
        info!(action = ?request.action, succeeded, total = request.len(), "Bulk action finished");

        if request.len() == 1 && succeeded == 0 {
            return Err((0, GalleryError::NotFound(request.records[0].uri.clone())));
        }
        Ok(succeeded)
    }

    /// Wait for every outstanding load and close the session
    pub async fn shutdown(mut self) {
        for handle in self.workers.drain(..) {
            if let Err(err) = handle.await {
                warn!(error = %err, "Load worker ended abnormally");
            }
        }
        debug!(kind = ?self.kind, "Session closed");
    }
}

impl std::fmt::Debug for ViewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewSession")
            .field("kind", &self.kind)
            .field("rows", &self.items.len())
            .field("mode", &self.selection.mode())
            .field("next_generation", &self.next_generation)
            .finish()
    }
}

fn bulk_notice(action: BulkAction, succeeded: usize, total: usize) -> Notice {
    if succeeded == total {
        let noun = if total == 1 { "item" } else { "items" };
        Notice::info(format!("{} {} {}.", action.past_tense(), succeeded, noun))
    } else {
        Notice::error(&GalleryError::IndexOperationFailed {
            action: action.past_tense(),
            succeeded,
            total,
        })
    }
}
