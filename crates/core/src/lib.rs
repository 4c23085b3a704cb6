//! Core domain types for shelfsync
//!
//! Everything the scrapers produce and the sync engine consumes lives here:
//! books and book sets, the supported tracker platforms, and the status events
//! the engine reports to its control surface.

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{
    normalize_cover_url, parse_start_date, Book, BookKey, BookSet, Platform, SeriesInfo,
    StatusEvent, StatusKind, Timestamp,
};
