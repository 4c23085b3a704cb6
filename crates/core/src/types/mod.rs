//! Domain types for shelfsync
//!
//! - `book`: Book, BookKey and series information
//! - `book_set`: ordered, key-unique result of one fetch
//! - `platform`: supported tracker sites
//! - `status`: status events reported to pollers
//! - `common`: timestamps, start-date parsing and cover URL normalization

mod book;
mod book_set;
mod common;
mod platform;
mod status;

pub use book::{Book, BookKey, SeriesInfo};
pub use book_set::BookSet;
pub use common::{normalize_cover_url, parse_start_date, Timestamp};
pub use platform::Platform;
pub use status::{StatusEvent, StatusKind};
