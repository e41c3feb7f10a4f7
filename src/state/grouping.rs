//! Grouping and sorting of media records into a sectioned list
//!
//! Takes the flat output of a media query and produces the header+entry
//! sequence a grid view renders. Pure and deterministic: "today" and the
//! timezone are passed in rather than read from the clock.

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use std::collections::HashMap;

use super::data::{DisplayItem, MediaRecord};

/// Label for records with no folder path
pub const UNKNOWN_FOLDER: &str = "Unknown Folder";
/// Label for records whose timestamp cannot be represented as a date
pub const UNKNOWN_DATE: &str = "Unknown Date";
pub const TODAY: &str = "Today";
pub const YESTERDAY: &str = "Yesterday";

/// Global ordering applied before grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Newest index ID first
    IdDesc,
    /// Newest add time first
    AddedDesc,
}

/// What records are grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// Folder path, trailing separator trimmed
    Folder,
    /// Calendar day of the add time
    DateBucket,
}

/// Order in which groups are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    /// Sorted by label
    Lexicographic,
    /// Today, Yesterday, then older days newest first.
    /// For folder groups this is the order of each folder's newest member.
    NewestFirst,
    /// Order in which each group's first member appears after sorting
    FirstSeen,
}

/// How a view turns records into a sectioned list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingPlan {
    pub sort: SortKey,
    pub key: GroupKey,
    pub order: GroupOrder,
}

impl GroupingPlan {
    /// Gallery layout: folders A-Z, newest ID first inside each folder
    pub fn by_folder() -> Self {
        Self {
            sort: SortKey::IdDesc,
            key: GroupKey::Folder,
            order: GroupOrder::Lexicographic,
        }
    }

    /// Trash layout: one section per day, newest first
    pub fn by_date() -> Self {
        Self {
            sort: SortKey::AddedDesc,
            key: GroupKey::DateBucket,
            order: GroupOrder::NewestFirst,
        }
    }
}

/// The reference day and timezone used to bucket timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateContext {
    pub today: NaiveDate,
    pub offset: FixedOffset,
}

impl DateContext {
    pub fn new(today: NaiveDate, offset: FixedOffset) -> Self {
        Self { today, offset }
    }

    /// Current local day and offset
    pub fn local_now() -> Self {
        let now = Local::now();
        Self {
            today: now.date_naive(),
            offset: *now.offset(),
        }
    }

    /// Which bucket a unix timestamp falls into
    pub fn bucket(&self, timestamp: i64) -> DateBucket {
        let Some(date) = DateTime::from_timestamp(timestamp, 0)
            .map(|utc| utc.with_timezone(&self.offset).date_naive())
        else {
            return DateBucket::Unknown;
        };

        if date == self.today {
            DateBucket::Today
        } else if Some(date) == self.today.pred_opt() {
            DateBucket::Yesterday
        } else {
            DateBucket::Day(date)
        }
    }
}

/// A date section of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateBucket {
    Today,
    Yesterday,
    Day(NaiveDate),
    Unknown,
}

impl DateBucket {
    pub fn label(&self) -> String {
        match self {
            DateBucket::Today => TODAY.to_string(),
            DateBucket::Yesterday => YESTERDAY.to_string(),
            DateBucket::Day(date) => date.format("%d %B, %Y").to_string(),
            DateBucket::Unknown => UNKNOWN_DATE.to_string(),
        }
    }

    /// Sort key for newest-first ordering (smaller sorts first)
    fn rank(&self) -> (u8, std::cmp::Reverse<Option<NaiveDate>>) {
        match self {
            DateBucket::Today => (0, std::cmp::Reverse(None)),
            DateBucket::Yesterday => (1, std::cmp::Reverse(None)),
            DateBucket::Day(date) => (2, std::cmp::Reverse(Some(*date))),
            DateBucket::Unknown => (3, std::cmp::Reverse(None)),
        }
    }
}

/// Folder label of a record
pub fn folder_label(record: &MediaRecord) -> String {
    match record.relative_path.as_deref().map(|p| p.trim_end_matches('/')) {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => UNKNOWN_FOLDER.to_string(),
    }
}

/// Sort records in place by the chosen key, newest first
///
/// The sort is stable, so ties keep their input order.
pub fn sort_records(records: &mut [MediaRecord], key: SortKey) {
    match key {
        SortKey::IdDesc => records.sort_by(|a, b| b.id.cmp(&a.id)),
        SortKey::AddedDesc => records.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Group {
    Folder(String),
    Date(DateBucket),
}

impl Group {
    fn label(&self) -> String {
        match self {
            Group::Folder(name) => name.clone(),
            Group::Date(bucket) => bucket.label(),
        }
    }
}

/// Build the sectioned display list for a set of records
///
/// Every group gets exactly one header followed by its members, and empty
/// groups never appear, so two headers are never adjacent.
pub fn build_display_list(
    mut records: Vec<MediaRecord>,
    plan: GroupingPlan,
    dates: &DateContext,
) -> Vec<DisplayItem> {
    sort_records(&mut records, plan.sort);

    // Groups in first-seen order
    let mut groups: Vec<(Group, Vec<MediaRecord>)> = Vec::new();
    let mut positions: HashMap<Group, usize> = HashMap::new();

    for record in records {
        let group = match plan.key {
            GroupKey::Folder => Group::Folder(folder_label(&record)),
            GroupKey::DateBucket => Group::Date(dates.bucket(record.date_added)),
        };
        match positions.get(&group) {
            Some(&idx) => groups[idx].1.push(record),
            None => {
                positions.insert(group.clone(), groups.len());
                groups.push((group, vec![record]));
            }
        }
    }

    match plan.order {
        GroupOrder::Lexicographic => groups.sort_by_cached_key(|(group, _)| group.label()),
        GroupOrder::NewestFirst => groups.sort_by(|(a, _), (b, _)| match (a, b) {
            (Group::Date(a), Group::Date(b)) => a.rank().cmp(&b.rank()),
            // Folder groups are already in newest-member order
            _ => std::cmp::Ordering::Equal,
        }),
        GroupOrder::FirstSeen => {}
    }

    let total: usize = groups.iter().map(|(_, members)| members.len() + 1).sum();
    let mut items = Vec::with_capacity(total);
    for (group, members) in groups {
        items.push(DisplayItem::header(group.label()));
        items.extend(members.into_iter().map(DisplayItem::entry));
    }
    items
}

/// Entries of a display list, headers dropped
pub fn entries(items: &[DisplayItem]) -> impl Iterator<Item = &MediaRecord> {
    items.iter().filter_map(DisplayItem::record)
}
