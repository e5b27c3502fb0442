//! Listing page parsing.
//!
//! Turns an archive or home page into an ordered list of [`PostReference`]s.
//! Card shape (how far up the tree a card starts, which tag holds the title
//! and which holds the date) comes from the site's [`ListingRules`].

use crate::config::ListingRules;
use crate::models::PostReference;
use crate::utils::{collapse_whitespace, slug_to_title};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, instrument};
use url::Url;

/// Extract post references from listing markup.
///
/// Anchors are kept when they resolve to the site's host and their path
/// starts with `post_prefix`. The first anchor for a slug wins and document
/// order is preserved.
#[instrument(level = "debug", skip_all, fields(base = %base_url))]
pub fn extract_listings(
    markup: &str,
    base_url: &Url,
    post_prefix: &str,
    rules: &ListingRules,
) -> Vec<PostReference> {
    let document = Html::parse_document(markup);
    let mut seen = HashSet::new();
    let mut references = Vec::new();

    for anchor in document.select(&rules.anchor) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut url) = base_url.join(href.trim()) else {
            continue;
        };
        if url.host_str() != base_url.host_str() {
            continue;
        }
        let Some(slug) = url.path().strip_prefix(post_prefix) else {
            continue;
        };
        let slug = slug.trim_end_matches('/').to_string();
        if slug.is_empty() || !seen.insert(slug.clone()) {
            continue;
        }

        url.set_query(None);
        url.set_fragment(None);

        let card = card_container(anchor, rules.card_depth);
        let title = first_text(card, &rules.title)
            .or_else(|| image_alt(card, rules))
            .unwrap_or_else(|| slug_to_title(&slug));
        let display_date = first_text(card, &rules.date).unwrap_or_default();

        references.push(PostReference {
            title,
            display_date,
            url: url.to_string(),
            slug,
        });
    }

    debug!(count = references.len(), "Extracted listing references");
    references
}

/// Walk `depth` element ancestors up from the anchor, stopping early at the root.
fn card_container(anchor: ElementRef<'_>, depth: usize) -> ElementRef<'_> {
    let mut card = anchor;
    for _ in 0..depth {
        match card.parent().and_then(ElementRef::wrap) {
            Some(parent) => card = parent,
            None => break,
        }
    }
    card
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .map(|e| collapse_whitespace(&e.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

fn image_alt(card: ElementRef<'_>, rules: &ListingRules) -> Option<String> {
    card.select(&rules.image)
        .filter_map(|img| img.value().attr("alt"))
        .map(collapse_whitespace)
        .find(|alt| !alt.is_empty())
}
