//! The StoryGraph client
//!
//! The public currently-reading page is tried with a plain GET first. The
//! site answers automated clients with 403 fairly often; in that case the
//! page is loaded through a [`PageRenderer`] and parsed the same way.

use crate::error::{ScrapeError, ScrapeResult};
use crate::render::{PageRenderer, RenderRequest, SessionCookie};
use crate::selectors::{
    self, SG_AUTHOR_LINK, SG_BOOK_PANE, SG_COVER_IMG, SG_LOGIN_FORM, SG_PANES, SG_READ_DATES,
    SG_SERIES_LINK, SG_SERIES_POSITION, SG_TITLE_LINK,
};
use crate::text::{absolute_url, collapse_whitespace, element_text, split_series};
use crate::traits::PlatformClient;
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use shelfsync_config::Config;
use shelfsync_core::{normalize_cover_url, Book, BookKey, BookSet, Platform, SeriesInfo};
use shelfsync_network::Client;
use std::sync::Arc;

pub const STORYGRAPH_BASE_URL: &str = "https://app.thestorygraph.com";

/// Cookie the site uses for persistent logins
pub const SESSION_COOKIE: &str = "remember_user_token";

const LOGIN_PATH: &str = "/users/sign_in";

pub struct StoryGraphClient {
    http: Client,
    renderer: Option<Arc<dyn PageRenderer>>,
    base_url: String,
}

impl StoryGraphClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, STORYGRAPH_BASE_URL)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            renderer: None,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Enables the headless fallback for 403 answers
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    fn listing_url(&self, username: &str) -> String {
        format!("{}/currently-reading/{}", self.base_url, username)
    }

    async fn fetch_page(&self, url: &str, config: &Config) -> ScrapeResult<(String, String)> {
        let token = config.reading.session_token();
        let headers: Vec<(&str, String)> = token
            .map(|t| vec![("Cookie", format!("{}={}", SESSION_COOKIE, t))])
            .unwrap_or_default();

        match self.http.get_with_headers(url, &headers).await {
            Ok(page) => Ok((page.body, page.final_url)),
            Err(e) if e.status() == Some(403) => {
                let Some(renderer) = &self.renderer else {
                    return Err(e.into());
                };
                log::info!("The StoryGraph rejected the direct fetch (403), rendering instead");

                let request = RenderRequest {
                    url: url.to_string(),
                    cookie: token.map(|t| SessionCookie {
                        name: SESSION_COOKIE.to_string(),
                        value: t.to_string(),
                        origin: self.base_url.clone(),
                    }),
                };
                let page = renderer.render(&request, &config.render).await?;
                Ok((page.html, page.final_url))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PlatformClient for StoryGraphClient {
    fn platform(&self) -> Platform {
        Platform::StoryGraph
    }

    async fn fetch(&self, config: &Config) -> ScrapeResult<BookSet> {
        let username = config
            .reading
            .identifier(Platform::StoryGraph)
            .ok_or(ScrapeError::NotConfigured(Platform::StoryGraph))?;

        let (html, final_url) = self.fetch_page(&self.listing_url(username), config).await?;

        if final_url.contains(LOGIN_PATH) || is_login_page(&html) {
            return Err(ScrapeError::AuthRequired(Platform::StoryGraph));
        }

        parse_storygraph_html(&html, &self.base_url)
    }

    fn profile_url(&self, config: &Config) -> Option<String> {
        config
            .reading
            .identifier(Platform::StoryGraph)
            .map(|username| format!("{}/profile/{}", self.base_url, username))
    }
}

/// Whether the page is the sign-in form rather than a listing
pub fn is_login_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    selectors::get(&SG_LOGIN_FORM)
        .map(|sel| document.select(sel).next().is_some())
        .unwrap_or(false)
}

/// Parses a currently-reading page into a book set
///
/// The site renders each book twice (mobile and desktop layouts); the second
/// copy is dropped by key.
pub fn parse_storygraph_html(html: &str, base_url: &str) -> ScrapeResult<BookSet> {
    let document = Html::parse_document(html);

    let panes = document
        .select(selectors::get(&SG_PANES)?)
        .next()
        .ok_or_else(|| ScrapeError::Parse("StoryGraph book list not found".to_string()))?;

    let mut books = BookSet::new();
    for (index, pane) in panes.select(selectors::get(&SG_BOOK_PANE)?).enumerate() {
        match parse_pane(pane, base_url) {
            Ok(Some(book)) => {
                if books.insert(book).is_err() {
                    log::trace!("Skipping repeated StoryGraph pane {}", index);
                }
            }
            Ok(None) => log::warn!("Skipping StoryGraph pane {}: no title", index),
            Err(e) => log::warn!("Skipping StoryGraph pane {}: {}", index, e),
        }
    }

    log::debug!("Parsed {} StoryGraph book(s)", books.len());
    Ok(books)
}

fn parse_pane(pane: ElementRef<'_>, base_url: &str) -> ScrapeResult<Option<Book>> {
    let Some(title_link) = pane.select(selectors::get(&SG_TITLE_LINK)?).next() else {
        return Ok(None);
    };
    let raw_title = element_text(title_link);
    if raw_title.is_empty() {
        return Ok(None);
    }
    let (title, title_series) = split_series(&raw_title);

    let authors: Vec<String> = pane
        .select(selectors::get(&SG_AUTHOR_LINK)?)
        .map(element_text)
        .filter(|a| !a.is_empty())
        .collect();
    let author = authors.join(", ");

    let href = title_link.value().attr("href");
    let key = match pane
        .value()
        .attr("data-book-id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        Some(id) => BookKey::new(id),
        None => match href.and_then(|h| h.strip_prefix("/books/")) {
            Some(id) if !id.is_empty() => BookKey::new(id),
            _ => BookKey::synthesize(&title, &author),
        },
    }?;

    let mut book = Book::new(key, title, author, Platform::StoryGraph);

    if let Some(href) = href {
        book = book.with_book_url(absolute_url(base_url, href));
    }

    if let Some(src) = pane
        .select(selectors::get(&SG_COVER_IMG)?)
        .next()
        .and_then(|img| img.value().attr("src"))
    {
        book = book.with_cover_art(normalize_cover_url(&absolute_url(base_url, src)));
    }

    if let Some(started) = pane
        .select(selectors::get(&SG_READ_DATES)?)
        .map(element_text)
        .find_map(|text| started_text(&text))
    {
        book = book.with_start_date(started);
    }

    if let Some(series) = series_from_link(pane)?.or(title_series) {
        book = book.with_series(series);
    }

    Ok(Some(book))
}

/// Extracts "Started Jan 5, 2024" style text, keeping only the date part
fn started_text(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find("started")?;
    let rest = text.get(start + "started".len()..)?;
    let rest = rest.trim_start_matches(':').trim();
    // "Started Jan 5, 2024 · 45%" carries progress after a separator
    let date = rest.split(['·', '|', '•']).next().unwrap_or(rest);
    let date = collapse_whitespace(date);
    (!date.is_empty()).then_some(date)
}

fn series_from_link(pane: ElementRef<'_>) -> ScrapeResult<Option<SeriesInfo>> {
    let Some(link) = pane.select(selectors::get(&SG_SERIES_LINK)?).next() else {
        return Ok(None);
    };
    let name = element_text(link);
    if name.is_empty() {
        return Ok(None);
    }

    // The position is printed next to the link, e.g. "<a>Stormlight</a> #2"
    let context = link
        .parent()
        .and_then(ElementRef::wrap)
        .map(element_text)
        .unwrap_or_default();
    let position = selectors::get(&SG_SERIES_POSITION)?
        .captures(&context)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    Ok(Some(SeriesInfo { name, position }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://app.thestorygraph.com";

    const MOCK_PAGE: &str = r#"
        <html><body><main>
        <div class="read-books-panes">
          <div class="book-pane" data-book-id="a1b2c3">
            <div class="book-cover"><img src="https://cdn.thestorygraph.com/covers/a1b2c3.jpg"></div>
            <div class="book-title-author-and-series">
              <h3><a href="/books/a1b2c3">Rhythm of War</a></h3>
              <p><a href="/series/42">The Stormlight Archive</a> #4</p>
              <p><a href="/authors/99">Brandon Sanderson</a></p>
            </div>
            <div class="read-dates">Started Mar 3, 2024 · 45%</div>
          </div>
          <div class="book-pane" data-book-id="a1b2c3">
            <div class="book-title-author-and-series">
              <h3><a href="/books/a1b2c3">Rhythm of War</a></h3>
            </div>
          </div>
          <div class="book-pane" data-book-id="">
            <div class="book-title-author-and-series">
              <h3><a href="/books/d4e5">Piranesi</a></h3>
              <p><a href="/authors/7">Susanna Clarke</a></p>
            </div>
          </div>
        </div>
        </main></body></html>
    "#;

    #[test]
    fn test_parse_page() {
        let books = parse_storygraph_html(MOCK_PAGE, BASE).expect("page should parse");
        assert_eq!(books.len(), 2);

        let first = books.first().expect("first book");
        assert_eq!(first.key.as_str(), "a1b2c3");
        assert_eq!(first.title, "Rhythm of War");
        assert_eq!(first.author, "Brandon Sanderson");
        assert_eq!(first.platform, Platform::StoryGraph);
        assert_eq!(
            first.book_url.as_deref(),
            Some("https://app.thestorygraph.com/books/a1b2c3")
        );
        assert_eq!(first.start_date.as_deref(), Some("Mar 3, 2024"));
        assert!(first.started_at().is_some());

        let series = first.series.as_ref().expect("series from link");
        assert_eq!(series.name, "The Stormlight Archive");
        assert_eq!(series.position.as_deref(), Some("4"));
    }

    #[test]
    fn test_key_falls_back_to_book_path() {
        let books = parse_storygraph_html(MOCK_PAGE, BASE).expect("page should parse");
        let keys: Vec<&str> = books.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a1b2c3", "d4e5"]);
    }

    #[test]
    fn test_empty_list_is_empty_set() {
        let html = r#"<div class="read-books-panes"></div>"#;
        let books = parse_storygraph_html(html, BASE).expect("empty list is valid");
        assert!(books.is_empty());
    }

    #[test]
    fn test_missing_list_is_parse_error() {
        let result = parse_storygraph_html("<html><body>Oops</body></html>", BASE);
        assert!(matches!(result, Err(ScrapeError::Parse(_))));
    }

    #[test]
    fn test_login_page_detected() {
        let html = r#"<form action="/users/sign_in" method="post">
            <input name="user[email]"></form>"#;
        assert!(is_login_page(html));
        assert!(!is_login_page(MOCK_PAGE));
    }

    #[test]
    fn test_started_text() {
        assert_eq!(started_text("Started Mar 3, 2024"), Some("Mar 3, 2024".to_string()));
        assert_eq!(started_text("started: 2024-01-05 | 10%"), Some("2024-01-05".to_string()));
        assert_eq!(started_text("Finished Jan 1, 2024"), None);
    }
}
