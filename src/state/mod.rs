/// State management module
///
/// This module handles all gallery state, including:
/// - Shared data structures (data.rs)
/// - The media index trait (index.rs) and its SQLite catalog (library.rs)
/// - Grouping records into sectioned lists (grouping.rs)
/// - Multi-select state (selection.rs)
/// - Edit scripts between lists (diff.rs)

pub mod data;
pub mod diff;
pub mod grouping;
pub mod index;
pub mod library;
pub mod selection;

pub use data::{DisplayItem, MediaKind, MediaRecord};
pub use index::{MediaIndex, MediaQuery, TrashFilter};
pub use library::Library;
