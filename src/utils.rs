//! Utility functions for text normalization, dates, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace collapsing and slug humanizing for listing titles
//! - Relative link resolution
//! - Long-form date rendering and parsing of structured-data timestamps
//! - String truncation for logging
//! - File system validation for output directories

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every run of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Turn a URL slug into a readable fallback title.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slug_to_title("rate-cut-watch"), "rate cut watch");
/// ```
pub fn slug_to_title(slug: &str) -> String {
    slug.replace('-', " ")
}

/// Resolve a possibly relative `href` against the page it appeared on.
pub fn resolve_href(page_url: &Url, href: &str) -> Option<String> {
    page_url.join(href).ok().map(|url| url.to_string())
}

/// Render a date the way the digest prints it, e.g. `February 21, 2026`.
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Reformat a structured-data timestamp as a long-form date.
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates. Anything else is
/// returned unchanged so an unusual but present date is never lost.
pub fn reformat_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return long_date(dt.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return long_date(date);
    }
    raw.to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backed off to a character
/// boundary) with an ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
