//! Full post extraction.
//!
//! Given a [`PostReference`], fetch the post page and turn it into a
//! [`PostContent`]:
//!
//! 1. Resolve metadata (JSON-LD, then meta tags, then listing values)
//! 2. Pick the content region from the site's ordered selectors, else `body`
//! 3. Mark noise and sponsor blocks as removed
//! 4. Convert what remains to Markdown
//! 5. Collect outbound links that leave the site
//!
//! Only the fetch can fail. A page whose region is empty yields an empty body.

use super::cleaning::Removed;
use super::{markdown, metadata};
use crate::config::Site;
use crate::error::ExtractionError;
use crate::fetch::Fetch;
use crate::models::{ExternalLink, PostContent, PostReference};
use crate::utils::{collapse_whitespace, truncate_for_log};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Fetch and extract one post.
#[instrument(level = "info", skip_all, fields(url = %reference.url))]
pub async fn extract<F: Fetch>(
    fetcher: &F,
    site: &Site,
    reference: &PostReference,
) -> Result<PostContent, ExtractionError> {
    let markup = fetcher
        .fetch(&reference.url)
        .await
        .map_err(|cause| ExtractionError {
            reference: reference.clone(),
            cause,
        })?;

    let post = extract_from_markup(site, reference, &markup);
    info!(
        bytes = markup.len(),
        body_chars = post.body_markdown.len(),
        links = post.external_links.len(),
        "Extracted post"
    );
    Ok(post)
}

/// Build a [`PostContent`] from already fetched post markup.
pub fn extract_from_markup(site: &Site, reference: &PostReference, markup: &str) -> PostContent {
    let document = Html::parse_document(markup);
    let meta = metadata::resolve(&document, reference, &site.default_author);

    let page_url = Url::parse(&reference.url).unwrap_or_else(|_| site.base_url.clone());
    let region = content_region(&document, site);
    let removed = site.noise.clean(region);
    debug!(removed = removed.len(), "Marked noise elements");

    let body_markdown = markdown::to_markdown(region, &removed, &page_url);
    if body_markdown.is_empty() {
        debug!(
            preview = %truncate_for_log(markup, 200),
            "Content region produced no text"
        );
    }
    let external_links = collect_links(region, &removed, &page_url, site);

    PostContent {
        title: meta.title,
        date: meta.date,
        url: reference.url.clone(),
        slug: reference.slug.clone(),
        author: meta.author,
        subtitle: meta.subtitle,
        body_markdown,
        external_links,
        featured_image: meta.featured_image,
        error: None,
    }
}

/// First region matched by the site's content selectors, else `body`, else the root.
fn content_region<'a>(document: &'a Html, site: &Site) -> ElementRef<'a> {
    site.content_selectors
        .iter()
        .find_map(|selector| document.select(selector).next())
        .or_else(|| document.select(&BODY).next())
        .unwrap_or_else(|| document.root_element())
}

/// Outbound links in document order, unique by URL.
///
/// Skips fragments, non-http(s) schemes, the site's own host and its
/// subdomains, share/subscription endpoints, and anchors without text.
fn collect_links(
    region: ElementRef<'_>,
    removed: &Removed,
    page_url: &Url,
    site: &Site,
) -> Vec<ExternalLink> {
    let site_host = site.host();
    let subdomain_suffix = format!(".{site_host}");

    region
        .select(&ANCHOR)
        .filter(|anchor| !removed.contains(*anchor))
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            if href.is_empty() || href.starts_with('#') {
                return None;
            }
            let url = page_url.join(href).ok()?;
            if !matches!(url.scheme(), "http" | "https") {
                return None;
            }
            let host = url.host_str()?;
            let host = host.strip_prefix("www.").unwrap_or(host);
            if host == site_host || host.ends_with(&subdomain_suffix) {
                return None;
            }
            if site.noise.is_blocked_link(url.as_str()) {
                return None;
            }
            let text = collapse_whitespace(&anchor.text().collect::<String>());
            if text.is_empty() {
                return None;
            }
            Some(ExternalLink {
                text,
                url: url.to_string(),
            })
        })
        .unique_by(|link| link.url.clone())
        .collect()
}
