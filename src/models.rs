//! Data models for discovered and extracted posts.
//!
//! This module defines the core data structures used throughout the application:
//! - [`PostReference`]: A lightweight pointer to a post found on a listing page
//! - [`PostContent`]: A fully extracted post, ready for the digest
//! - [`ExternalLink`]: An outbound link collected from a post body
//! - [`PostOutcome`]: The per-post result of extraction, success or failure
//! - [`Digest`]: The JSON shape of a finished digest
//!
//! Nothing here is persisted; a post lives for one digest build.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A post discovered on a listing or archive page.
///
/// Produced by listing discovery before the post itself is fetched. The URL
/// path is the uniqueness key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostReference {
    /// Title as shown on the listing card (or derived from the slug).
    pub title: String,
    /// Date as shown on the listing card, unparsed (may be relative, e.g. "3 days ago").
    pub display_date: String,
    /// Absolute URL of the post page.
    pub url: String,
    /// Final path segment after the post-path prefix.
    pub slug: String,
}

/// An outbound link found in a post body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExternalLink {
    pub text: String,
    pub url: String,
}

/// A fully extracted post.
///
/// Built once per reference and never mutated afterwards. When extraction
/// fails, [`PostOutcome::into_content`] synthesizes a placeholder so every
/// requested slot is still represented in the digest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostContent {
    pub title: String,
    /// Long-form publish date when structured data provides one, else the listing date.
    pub date: String,
    pub url: String,
    pub slug: String,
    pub author: String,
    /// Post description; empty when the page has none.
    pub subtitle: String,
    pub body_markdown: String,
    /// URL-unique, in first-seen document order.
    pub external_links: Vec<ExternalLink>,
    pub featured_image: Option<String>,
    /// Set on placeholders only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PostContent {
    /// Whether this post is a placeholder for a failed extraction.
    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// The result of extracting one post.
#[derive(Debug)]
pub enum PostOutcome {
    Fetched(PostContent),
    Failed {
        reference: PostReference,
        reason: String,
    },
}

impl PostOutcome {
    /// Collapse the outcome into something the formatter can render.
    ///
    /// A failed outcome keeps the reference's title, date and URL, uses the
    /// site's default author, and carries the failure message in place of a body.
    pub fn into_content(self, default_author: &str) -> PostContent {
        match self {
            PostOutcome::Fetched(content) => content,
            PostOutcome::Failed { reference, reason } => PostContent {
                title: reference.title,
                date: reference.display_date,
                url: reference.url,
                slug: reference.slug,
                author: default_author.to_string(),
                subtitle: String::new(),
                body_markdown: format!("*Unable to fetch this post: {reason}*"),
                external_links: Vec::new(),
                featured_image: None,
                error: Some(reason),
            },
        }
    }
}

/// A finished digest as written to the JSON output.
#[derive(Debug, Deserialize, Serialize)]
pub struct Digest {
    /// Site key the digest was built from.
    pub site: String,
    /// Human-readable site name.
    pub site_name: String,
    pub compiled_on: NaiveDate,
    pub posts: Vec<PostContent>,
}
