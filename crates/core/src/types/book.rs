//! Book domain model

use crate::error::{CoreError, CoreResult};
use crate::types::common::parse_start_date;
use crate::types::platform::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a book within a platform's listing
///
/// Never empty. Either the platform's natural identifier (ISBN, book id) or a
/// slug synthesized from title and author.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookKey(String);

impl BookKey {
    /// Creates a key from a natural identifier
    pub fn new(raw: impl AsRef<str>) -> CoreResult<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Synthesizes a fallback key from title and author
    ///
    /// The result is deterministic: the same title/author pair always yields
    /// the same key, so selections survive refreshes.
    pub fn synthesize(title: &str, author: &str) -> CoreResult<Self> {
        let title = slugify(title);
        let author = slugify(author);

        match (title.is_empty(), author.is_empty()) {
            (true, true) => Err(CoreError::NoKeyMaterial),
            (false, true) => Ok(Self(title)),
            (true, false) => Ok(Self(author)),
            (false, false) => Ok(Self(format!("{}--{}", title, author))),
        }
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BookKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BookKey> for String {
    fn from(key: BookKey) -> Self {
        key.0
    }
}

fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Series membership of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub name: String,
    /// Position within the series as printed ("1", "2.5")
    pub position: Option<String>,
}

/// A book the user is currently reading, as scraped from a tracker site
///
/// Immutable snapshot: the next fetch replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub key: BookKey,
    pub title: String,
    pub author: String,
    /// Cover image URL with size-suffix tokens stripped
    pub cover_art: Option<String>,
    /// Start date as printed by the platform
    pub start_date: Option<String>,
    pub platform: Platform,
    pub book_url: Option<String>,
    pub series: Option<SeriesInfo>,
}

impl Book {
    /// Creates a book with only the required fields set
    pub fn new(
        key: BookKey,
        title: impl Into<String>,
        author: impl Into<String>,
        platform: Platform,
    ) -> Self {
        Self {
            key,
            title: title.into(),
            author: author.into(),
            cover_art: None,
            start_date: None,
            platform,
            book_url: None,
            series: None,
        }
    }

    pub fn with_cover_art(mut self, url: impl Into<String>) -> Self {
        self.cover_art = Some(url.into());
        self
    }

    pub fn with_start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn with_book_url(mut self, url: impl Into<String>) -> Self {
        self.book_url = Some(url.into());
        self
    }

    pub fn with_series(mut self, series: SeriesInfo) -> Self {
        self.series = Some(series);
        self
    }

    /// Start date as epoch seconds, if the free text parses
    pub fn started_at(&self) -> Option<i64> {
        self.start_date.as_deref().and_then(parse_start_date)
    }

    /// "Title by Author" label used in listings
    pub fn display_label(&self) -> String {
        if self.author.is_empty() {
            self.title.clone()
        } else {
            format!("{} by {}", self.title, self.author)
        }
    }
}
