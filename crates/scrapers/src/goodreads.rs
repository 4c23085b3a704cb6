//! Goodreads client
//!
//! Reads the "currently-reading" shelf of the public review list at
//! `/review/list/{user_id}?shelf=currently-reading`, which renders as a plain
//! HTML table without JavaScript.

use crate::error::{ScrapeError, ScrapeResult};
use crate::selectors::{
    self, GR_AUTHOR_LINK, GR_BOOKS_TABLE, GR_BOOK_ID, GR_COVER_IMG, GR_DATE_STARTED, GR_ISBN,
    GR_ISBN13, GR_ROW, GR_TITLE_LINK,
};
use crate::text::{absolute_url, display_author, element_text, normalize_isbn, split_series};
use crate::traits::PlatformClient;
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use shelfsync_config::Config;
use shelfsync_core::{normalize_cover_url, Book, BookKey, BookSet, Platform};
use shelfsync_network::Client;

pub const GOODREADS_BASE_URL: &str = "https://www.goodreads.com";

/// Goodreads shelf scraper
pub struct GoodreadsClient {
    http: Client,
    base_url: String,
}

impl GoodreadsClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, GOODREADS_BASE_URL)
    }

    /// Points the client at another host; used against mock servers
    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn shelf_url(&self, user_id: &str) -> String {
        format!(
            "{}/review/list/{}?shelf=currently-reading&per_page=100",
            self.base_url, user_id
        )
    }
}

#[async_trait]
impl PlatformClient for GoodreadsClient {
    fn platform(&self) -> Platform {
        Platform::Goodreads
    }

    async fn fetch(&self, config: &Config) -> ScrapeResult<BookSet> {
        let user_id = config
            .reading
            .identifier(Platform::Goodreads)
            .ok_or(ScrapeError::NotConfigured(Platform::Goodreads))?;

        let page = self.http.get(&self.shelf_url(user_id)).await?;
        log::debug!(
            "Goodreads shelf fetched ({} bytes) from {}",
            page.body.len(),
            page.final_url
        );

        if page.final_url.contains("/user/sign_in") {
            return Err(ScrapeError::AuthRequired(Platform::Goodreads));
        }

        parse_goodreads_html(&page.body, &self.base_url)
    }

    fn profile_url(&self, config: &Config) -> Option<String> {
        config
            .reading
            .identifier(Platform::Goodreads)
            .map(|id| format!("{}/user/show/{}", self.base_url, id))
    }
}

/// Parses a Goodreads review-list page into a book set
///
/// Rows that cannot be turned into a book are skipped with a warning.
/// Fails only when the `#books` table itself is missing.
pub fn parse_goodreads_html(html: &str, base_url: &str) -> ScrapeResult<BookSet> {
    let document = Html::parse_document(html);

    let table = document
        .select(selectors::get(&GR_BOOKS_TABLE)?)
        .next()
        .ok_or_else(|| ScrapeError::Parse("Goodreads shelf table not found".to_string()))?;

    let mut books = BookSet::new();
    for (index, row) in table.select(selectors::get(&GR_ROW)?).enumerate() {
        let book = match parse_row(row, base_url) {
            Ok(Some(book)) => book,
            Ok(None) => {
                log::warn!("Skipping Goodreads row {}: no title", index);
                continue;
            }
            Err(e) => {
                log::warn!("Skipping Goodreads row {}: {}", index, e);
                continue;
            }
        };

        if let Err(e) = books.insert(book) {
            log::debug!("Skipping Goodreads row {}: {}", index, e);
        }
    }

    log::debug!("Parsed {} Goodreads book(s)", books.len());
    Ok(books)
}

fn parse_row(row: ElementRef<'_>, base_url: &str) -> ScrapeResult<Option<Book>> {
    let Some(title_link) = row.select(selectors::get(&GR_TITLE_LINK)?).next() else {
        return Ok(None);
    };

    let raw_title = title_link
        .value()
        .attr("title")
        .map(crate::text::collapse_whitespace)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| element_text(title_link));
    if raw_title.is_empty() {
        return Ok(None);
    }
    let (title, series) = split_series(&raw_title);

    let author = row
        .select(selectors::get(&GR_AUTHOR_LINK)?)
        .next()
        .map(|a| display_author(&element_text(a)))
        .unwrap_or_default();

    let href = title_link.value().attr("href");
    let key = row_key(row, href, &title, &author)?;

    let mut book = Book::new(key, title, author, Platform::Goodreads);

    if let Some(href) = href {
        book = book.with_book_url(absolute_url(base_url, href));
    }

    if let Some(src) = row
        .select(selectors::get(&GR_COVER_IMG)?)
        .next()
        .and_then(|img| img.value().attr("src"))
    {
        book = book.with_cover_art(normalize_cover_url(src));
    }

    let started = row
        .select(selectors::get(&GR_DATE_STARTED)?)
        .map(element_text)
        .find(|text| !text.is_empty() && !text.eq_ignore_ascii_case("not set"));
    if let Some(started) = started {
        book = book.with_start_date(started);
    }

    if let Some(series) = series {
        book = book.with_series(series);
    }

    Ok(Some(book))
}

/// ISBN first, then the Goodreads book id, then a title/author slug
fn row_key(
    row: ElementRef<'_>,
    href: Option<&str>,
    title: &str,
    author: &str,
) -> ScrapeResult<BookKey> {
    for selector in [&GR_ISBN13, &GR_ISBN] {
        let isbn = row
            .select(selectors::get(selector)?)
            .next()
            .and_then(|cell| normalize_isbn(&element_text(cell)));
        if let Some(isbn) = isbn {
            return Ok(BookKey::new(isbn)?);
        }
    }

    let book_id = href.and_then(|href| {
        selectors::get(&GR_BOOK_ID)
            .ok()
            .and_then(|re| re.captures(href))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    });
    if let Some(id) = book_id {
        return Ok(BookKey::new(id)?);
    }

    Ok(BookKey::synthesize(title, author)?)
}
