//! Shutterframe - gallery core for a camera app
//!
//! Browses photos and videos grouped by folder or by day, supports
//! multi-select with bulk actions, and manages a trash/restore workflow
//! on top of a media index.
//!
//! - [`state`]: records, the media index, grouping, selection and diffing
//! - [`session`]: per-view sessions that own their list and background loads
//! - [`import`]: populating the index from folders on disk
//! - [`config`]: user configuration
//! - [`errors`]: error taxonomy

pub mod config;
pub mod errors;
pub mod import;
pub mod session;
pub mod state;

pub use config::Config;
pub use errors::{GalleryError, GalleryResult};
pub use session::{
    BulkAction, BulkOutcome, BulkRequest, Confirmation, LoadEvent, Notice, ViewKind, ViewSession,
};
