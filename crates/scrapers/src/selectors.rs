//! Compiled CSS selectors and patterns for the tracker pages

use crate::error::{ScrapeError, ScrapeResult};
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

type Compiled<T> = LazyLock<Result<T, String>>;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: Compiled<Selector> = LazyLock::new(|| {
            Selector::parse($css).map_err(|e| format!("invalid selector {:?}: {:?}", $css, e))
        });
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: Compiled<Regex> = LazyLock::new(|| {
            Regex::new($regex).map_err(|e| format!("invalid pattern {:?}: {}", $regex, e))
        });
    };
}

/// Borrows a compiled selector or pattern, surfacing a bad literal as a parse error
pub(crate) fn get<T>(compiled: &'static Compiled<T>) -> ScrapeResult<&'static T> {
    compiled
        .as_ref()
        .map_err(|e| ScrapeError::Parse(e.clone()))
}

// Goodreads review list (shelf=currently-reading)
selector!(GR_BOOKS_TABLE, "table#books");
selector!(GR_ROW, "tr.bookalike.review, tr.review");
selector!(GR_TITLE_LINK, "td.field.title a");
selector!(GR_AUTHOR_LINK, "td.field.author a");
selector!(GR_COVER_IMG, "td.field.cover img");
selector!(GR_ISBN13, "td.field.isbn13 div.value");
selector!(GR_ISBN, "td.field.isbn div.value");
selector!(GR_DATE_STARTED, "td.field.date_started span.date_started_value, td.field.date_started div.value");
regex!(GR_BOOK_ID, r"/book/show/(\d+)");

// StoryGraph currently-reading page
selector!(SG_PANES, "div.read-books-panes");
selector!(SG_BOOK_PANE, "div.book-pane");
selector!(SG_TITLE_LINK, "div.book-title-author-and-series h3 a[href^='/books/']");
selector!(SG_AUTHOR_LINK, "div.book-title-author-and-series a[href^='/authors/']");
selector!(SG_SERIES_LINK, "div.book-title-author-and-series a[href^='/series/']");
selector!(SG_COVER_IMG, "div.book-cover img");
selector!(SG_READ_DATES, "div.read-dates, p.read-dates");
selector!(SG_LOGIN_FORM, "form[action*='/users/sign_in'], input[name='user[email]']");
regex!(SG_SERIES_POSITION, r"#\s*(\d+(?:\.\d+)?)");

// Both sites append the series to the displayed title: "Title (Series, #2)"
regex!(TITLE_SERIES, r"^(.*?)\s*\(([^()]+?),?\s*#\s*(\d+(?:\.\d+)?)\)\s*$");
