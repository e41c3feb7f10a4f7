//! Multi-select state for a list view
//!
//! A view is either browsing (taps open the item) or selecting (taps toggle
//! membership). The selected set exists only while selecting.

use std::collections::HashSet;

use super::data::{DisplayItem, MediaRecord};

/// Selected record locators
pub type SelectionSet = HashSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Browsing,
    Selecting,
}

/// What a tap did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// Browsing: open the record's detail view
    Open(MediaRecord),
    /// Selecting: the record's membership flipped to this value
    Toggled { selected: bool },
}

#[derive(Debug, Default)]
pub struct Selection {
    mode: SelectionMode,
    selected: SelectionSet,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_selecting(&self) -> bool {
        self.mode == SelectionMode::Selecting
    }

    /// Enter selection mode with nothing selected.
    /// Does nothing if already selecting.
    pub fn enter(&mut self) {
        if self.mode == SelectionMode::Browsing {
            self.mode = SelectionMode::Selecting;
            self.selected.clear();
        }
    }

    /// Long-press on an entry
    ///
    /// While browsing this starts a selection with the pressed record in it
    /// and returns true. While selecting it is ignored and returns false.
    pub fn long_press(&mut self, record: &MediaRecord) -> bool {
        if self.is_selecting() {
            return false;
        }
        self.enter();
        self.selected.insert(record.selection_key().to_string());
        true
    }

    pub fn tap(&mut self, record: &MediaRecord) -> TapOutcome {
        if !self.is_selecting() {
            return TapOutcome::Open(record.clone());
        }

        let key = record.selection_key();
        let selected = if self.selected.remove(key) {
            false
        } else {
            self.selected.insert(key.to_string());
            true
        };
        TapOutcome::Toggled { selected }
    }

    /// Select every entry in the list. Ignored while browsing.
    pub fn select_all(&mut self, items: &[DisplayItem]) {
        if !self.is_selecting() {
            return;
        }
        self.selected.extend(
            items
                .iter()
                .filter_map(DisplayItem::record)
                .map(|r| r.selection_key().to_string()),
        );
    }

    /// Deselect everything, staying in selection mode
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Leave selection mode and drop the selected set
    pub fn cancel(&mut self) {
        self.mode = SelectionMode::Browsing;
        self.selected.clear();
    }

    pub fn is_selected(&self, record: &MediaRecord) -> bool {
        self.selected.contains(record.selection_key())
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    /// Bulk actions are only offered with something selected
    pub fn actions_enabled(&self) -> bool {
        self.is_selecting() && !self.selected.is_empty()
    }

    pub fn selected(&self) -> &SelectionSet {
        &self.selected
    }

    /// Selected records in list order, copied out of the current list
    pub fn snapshot(&self, items: &[DisplayItem]) -> Vec<MediaRecord> {
        items
            .iter()
            .filter_map(DisplayItem::record)
            .filter(|r| self.is_selected(r))
            .cloned()
            .collect()
    }

    /// Forget keys whose records are no longer listed
    pub fn retain_listed(&mut self, items: &[DisplayItem]) {
        if self.selected.is_empty() {
            return;
        }
        let listed: HashSet<&str> = items
            .iter()
            .filter_map(DisplayItem::record)
            .map(MediaRecord::selection_key)
            .collect();
        self.selected.retain(|key| listed.contains(key.as_str()));
    }
}
