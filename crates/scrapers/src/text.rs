//! Text normalization shared by the page parsers

use crate::selectors::{self, TITLE_SERIES};
use scraper::ElementRef;
use shelfsync_core::SeriesInfo;

/// Element text with runs of whitespace collapsed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits "Title (Series, #2)" into the bare title and its series
pub(crate) fn split_series(title: &str) -> (String, Option<SeriesInfo>) {
    let Ok(pattern) = selectors::get(&TITLE_SERIES) else {
        return (title.to_string(), None);
    };

    match pattern.captures(title) {
        Some(caps) => {
            let bare = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let name = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            if bare.is_empty() || name.is_empty() {
                return (title.to_string(), None);
            }
            let series = SeriesInfo {
                name: name.to_string(),
                position: caps.get(3).map(|m| m.as_str().to_string()),
            };
            (bare.to_string(), Some(series))
        }
        None => (title.to_string(), None),
    }
}

/// Turns a "Last, First" listing name into "First Last"
pub(crate) fn display_author(raw: &str) -> String {
    let name = collapse_whitespace(raw.trim_end_matches('*'));
    let mut parts = name.splitn(3, ',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(last), Some(first), None) if !first.trim().is_empty() => {
            format!("{} {}", first.trim(), last.trim())
        }
        _ => name,
    }
}

/// Resolves a site-relative link against the site base URL
pub(crate) fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}

/// Accepts ISBN-10 and ISBN-13 values, ignoring hyphens
pub(crate) fn normalize_isbn(raw: &str) -> Option<String> {
    let isbn: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let valid = match isbn.len() {
        13 => isbn.chars().all(|c| c.is_ascii_digit()),
        10 => {
            let (body, check) = isbn.split_at(9);
            body.chars().all(|c| c.is_ascii_digit())
                && check.chars().all(|c| c.is_ascii_digit() || c == 'X' || c == 'x')
        }
        _ => false,
    };
    valid.then(|| isbn.to_ascii_uppercase())
}
