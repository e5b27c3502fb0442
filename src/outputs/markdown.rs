//! Markdown digest rendering.
//!
//! Produces one document for a list of posts: a header naming the site and
//! post count, the compile date, a fixed note for the summarizer, then one
//! section per post in input order. Placeholders render through the same
//! path as real posts, so the section count always equals the post count.
//!
//! # Layout
//!
//! ```text
//! # Morning Brief: 2 Latest Posts
//! *Compiled February 21, 2026*
//!
//! <instructions>
//!
//! ---
//!
//! ## 1. Title
//! **Date:** ... | **Author:** ...
//! **Source:** https://...
//! **Summary:** ...
//!
//! body
//!
//! **Links:**
//! - [text](url)
//!
//! ---
//!
//! ## 2. Title
//! ...
//! ```

use crate::models::PostContent;
use crate::utils::long_date;
use chrono::NaiveDate;

/// Separator between the preamble and each post section.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

const INSTRUCTIONS: &str = "The posts below were collected from the newsletter archive and \
converted to plain Markdown. Each section starts with the post's metadata followed by its full \
text and the external links it cites. Summarize each post on its own, keep the original order, \
and cite the source URL for every claim. Sections marked as unable to fetch have no content and \
should be reported as unavailable rather than summarized.";

/// Render posts into a single Markdown digest.
///
/// Output depends only on the arguments, so the same posts and date always
/// render byte-identical documents.
pub fn format_digest(site_name: &str, posts: &[PostContent], compiled_on: NaiveDate) -> String {
    let noun = if posts.len() == 1 { "Post" } else { "Posts" };
    let preamble = format!(
        "# {site_name}: {} Latest {noun}\n*Compiled {}*\n\n{INSTRUCTIONS}",
        posts.len(),
        long_date(compiled_on),
    );

    std::iter::once(preamble)
        .chain(
            posts
                .iter()
                .enumerate()
                .map(|(i, post)| format_post(i + 1, post)),
        )
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
        + "\n"
}

/// Render one numbered post section.
pub fn format_post(number: usize, post: &PostContent) -> String {
    let mut lines = vec![
        format!("## {number}. {}", post.title),
        format!("**Date:** {} | **Author:** {}", or_unknown(&post.date), post.author),
        format!("**Source:** {}", post.url),
    ];
    if !post.subtitle.is_empty() {
        lines.push(format!("**Summary:** {}", post.subtitle));
    }
    if let Some(image) = &post.featured_image {
        lines.push(format!("![{}]({image})", post.title));
    }

    let mut section = lines.join("\n");
    if !post.body_markdown.is_empty() {
        section.push_str("\n\n");
        section.push_str(&post.body_markdown);
    }
    if !post.external_links.is_empty() {
        section.push_str("\n\n**Links:**\n");
        let links = post
            .external_links
            .iter()
            .map(|link| format!("- [{}]({})", link.text, link.url))
            .collect::<Vec<_>>()
            .join("\n");
        section.push_str(&links);
    }
    section
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() { "Unknown" } else { value }
}
