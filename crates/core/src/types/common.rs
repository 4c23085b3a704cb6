//! Shared helpers: timestamps, start-date parsing and cover URL normalization

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in milliseconds since Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp for the current moment
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Creates a timestamp from milliseconds since Unix epoch
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since Unix epoch
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch
    pub fn as_seconds(&self) -> i64 {
        self.0 / 1000
    }

    /// Converts to a UTC datetime for display
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{}", self.0),
        }
    }
}

const FULL_DATE_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
];

/// Parses a free-text start date into epoch seconds (midnight UTC)
///
/// Accepts the shapes tracker sites print: "Jan 05, 2024", "5th January 2024",
/// "Started March 2023", "2024-01-05", or a bare year. Anything else yields
/// `None`; callers treat that as "no timestamp", never as a failure.
pub fn parse_start_date(text: &str) -> Option<i64> {
    let cleaned = clean_date_text(text);
    if cleaned.is_empty() {
        return None;
    }

    // Partial dates are matched by shape first; chrono would otherwise happily
    // read "Jan 2024" as day 20 of year 24.
    let tokens: Vec<&str> = cleaned.split(' ').collect();
    let date = match tokens.as_slice() {
        [year] if is_year(year) => year
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
        [month, year] if month.chars().all(char::is_alphabetic) && is_year(year) => {
            let with_day = format!("1 {} {}", month, year);
            ["%d %b %Y", "%d %B %Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&with_day, fmt).ok())
        }
        _ => FULL_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok()),
    }?;

    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp())
}

fn is_year(token: &str) -> bool {
    token.len() == 4 && token.chars().all(|c| c.is_ascii_digit())
}

fn clean_date_text(text: &str) -> String {
    let mut trimmed = text.trim();
    if let Some(prefix) = trimmed.get(..7) {
        if prefix.eq_ignore_ascii_case("started") {
            trimmed = trimmed[7..].trim_start_matches(':').trim();
        }
    }

    trimmed
        .split_whitespace()
        .map(strip_ordinal)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_ordinal(token: &str) -> String {
    let (body, comma) = match token.strip_suffix(',') {
        Some(body) => (body, ","),
        None => (token, ""),
    };
    let digits: String = body.chars().take_while(|c| c.is_ascii_digit()).collect();
    let rest = &body[digits.len()..];

    if !digits.is_empty() && matches!(rest, "st" | "nd" | "rd" | "th") {
        format!("{}{}", digits, comma)
    } else {
        token.to_string()
    }
}

/// Strips size-suffix tokens from a cover image URL
///
/// Goodreads serves thumbnails such as `.../12345._SY75_.jpg`; the same path
/// without the `._SY75_` token is the full-size cover.
pub fn normalize_cover_url(url: &str) -> String {
    let url = url.trim();
    let (base, query) = match url.find('?') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    };

    let Some(dot) = base.rfind('.') else {
        return url.to_string();
    };
    let (stem, ext) = base.split_at(dot);
    if ext.contains('/') {
        return url.to_string();
    }

    if let Some(start) = stem.rfind("._") {
        let token = &stem[start + 2..];
        if token.len() > 1 && token.ends_with('_') && !token.contains('/') {
            return format!("{}{}{}", &stem[..start], ext, query);
        }
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_from_millis() {
        let t = Timestamp::from_millis(1_234_567_890_123);
        assert_eq!(t.as_millis(), 1_234_567_890_123);
        assert_eq!(t.as_seconds(), 1_234_567_890);
    }

    #[test]
    fn test_timestamp_ordering() {
        assert!(Timestamp::from_millis(1000) < Timestamp::from_millis(2000));
    }

    #[test]
    fn test_timestamp_display() {
        let t = Timestamp::from_millis(0);
        assert_eq!(t.to_string(), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_parse_goodreads_date() {
        assert_eq!(parse_start_date("Jan 05, 2024"), Some(1_704_412_800));
        assert_eq!(parse_start_date("  Jan 5, 2024 "), Some(1_704_412_800));
    }

    #[test]
    fn test_parse_ordinal_and_prefix() {
        assert_eq!(parse_start_date("Started 5th January 2024"), Some(1_704_412_800));
        assert_eq!(parse_start_date("started: Jan 5th, 2024"), Some(1_704_412_800));
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_start_date("2024-01-05"), Some(1_704_412_800));
    }

    #[test]
    fn test_parse_month_year() {
        assert_eq!(parse_start_date("Jan 2024"), Some(1_704_067_200));
        assert_eq!(parse_start_date("January 2024"), Some(1_704_067_200));
    }

    #[test]
    fn test_parse_year_only() {
        assert_eq!(parse_start_date("2024"), Some(1_704_067_200));
    }

    #[test]
    fn test_unparseable_dates() {
        assert_eq!(parse_start_date(""), None);
        assert_eq!(parse_start_date("not set"), None);
        assert_eq!(parse_start_date("someday"), None);
    }

    #[test]
    fn test_cover_suffix_stripped() {
        assert_eq!(
            normalize_cover_url("https://i.gr-assets.com/images/S/books/12345._SY75_.jpg"),
            "https://i.gr-assets.com/images/S/books/12345.jpg"
        );
        assert_eq!(
            normalize_cover_url("https://i.gr-assets.com/images/S/books/12345._SX98_SY160_.jpg"),
            "https://i.gr-assets.com/images/S/books/12345.jpg"
        );
    }

    #[test]
    fn test_cover_without_suffix_unchanged() {
        let url = "https://cdn.thestorygraph.com/covers/abc.jpg";
        assert_eq!(normalize_cover_url(url), url);
    }

    #[test]
    fn test_cover_query_preserved() {
        assert_eq!(
            normalize_cover_url("https://example.com/c/1._SY75_.png?v=2"),
            "https://example.com/c/1.png?v=2"
        );
    }
}
