//! Post metadata recovery.
//!
//! Each field is resolved by a [`Chain`]: an ordered list of
//! resolvers, each of which may yield a value. The first non-empty value
//! wins. Sources, from most to least trusted:
//!
//! 1. Embedded JSON-LD (`script[type="application/ld+json"]`)
//! 2. OpenGraph / article meta tags
//! 3. Listing-derived values from the [`PostReference`]
//! 4. The page's first `h1` (title only)

use crate::error::ParseError;
use crate::models::PostReference;
use crate::utils::{collapse_whitespace, reformat_date};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

static JSON_LD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());

/// A lazily evaluated metadata source.
pub type Resolver<'a> = Box<dyn Fn() -> Option<String> + 'a>;

/// An ordered priority chain of resolvers.
#[derive(Default)]
pub struct Chain<'a> {
    resolvers: Vec<Resolver<'a>>,
}

impl<'a> Chain<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a lower-priority source.
    pub fn then(mut self, resolver: impl Fn() -> Option<String> + 'a) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// The first non-empty value with whitespace collapsed, trying sources in order.
    pub fn resolve(&self) -> Option<String> {
        self.resolvers
            .iter()
            .filter_map(|resolver| resolver())
            .map(|v| collapse_whitespace(&v))
            .find(|v| !v.is_empty())
    }
}

/// Metadata recovered for one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMetadata {
    pub title: String,
    pub date: String,
    pub subtitle: String,
    pub author: String,
    pub featured_image: Option<String>,
}

/// All JSON-LD objects embedded in a page.
///
/// Top-level arrays and `@graph` arrays are flattened. Blocks that are not
/// valid JSON are skipped.
pub struct StructuredData {
    objects: Vec<Value>,
}

impl StructuredData {
    pub fn from_document(document: &Html) -> Self {
        let mut objects = Vec::new();
        for script in document.select(&JSON_LD) {
            let text = script.text().collect::<String>();
            match parse_block(&text) {
                Ok(value) => flatten_into(value, &mut objects),
                Err(e) => debug!(error = %e, "Skipping structured data block"),
            }
        }
        Self { objects }
    }

    /// First non-empty value for `field` across all objects, in document order.
    fn field(&self, field: &str, extract: impl Fn(&Value) -> Option<String>) -> Option<String> {
        self.objects
            .iter()
            .filter_map(|object| object.get(field))
            .filter_map(extract)
            .find(|v| !v.trim().is_empty())
    }

    pub fn headline(&self) -> Option<String> {
        self.field("headline", |v| v.as_str().map(str::to_string))
    }

    pub fn date_published(&self) -> Option<String> {
        self.field("datePublished", |v| v.as_str().map(str::to_string))
    }

    pub fn description(&self) -> Option<String> {
        self.field("description", |v| v.as_str().map(str::to_string))
    }

    /// `image.url`, a bare image string, or the first usable array entry.
    pub fn image_url(&self) -> Option<String> {
        self.field("image", |v| nested(v, "url"))
    }

    /// `author.name`, or the name of the first author in an array.
    pub fn author_name(&self) -> Option<String> {
        self.field("author", |v| nested(v, "name"))
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn parse_block(text: &str) -> Result<Value, ParseError> {
    Ok(serde_json::from_str(text.trim())?)
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|v| flatten_into(v, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_into(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

/// A string, an object holding `key`, or an array of either.
fn nested(value: &Value, key: &str) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get(key).and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => items.iter().find_map(|item| nested(item, key)),
        _ => None,
    }
}

/// `<meta property=...>` or `<meta name=...>` content.
pub fn meta_content(document: &Html, name: &str) -> Option<String> {
    let selector =
        Selector::parse(&format!(r#"meta[property="{name}"], meta[name="{name}"]"#)).ok()?;
    document
        .select(&selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn first_heading(document: &Html) -> Option<String> {
    document
        .select(&H1)
        .map(|h| collapse_whitespace(&h.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

/// Resolve every metadata field for a post page.
pub fn resolve(document: &Html, reference: &PostReference, default_author: &str) -> PostMetadata {
    let ld = StructuredData::from_document(document);
    if ld.is_empty() {
        debug!(url = %reference.url, "No structured data; using meta tag fallbacks");
    }

    let title = Chain::new()
        .then(|| ld.headline())
        .then(|| meta_content(document, "og:title"))
        .then(|| Some(reference.title.clone()))
        .then(|| first_heading(document))
        .resolve()
        .unwrap_or_default();

    let date = Chain::new()
        .then(|| ld.date_published().map(|d| reformat_date(&d)))
        .then(|| meta_content(document, "article:published_time").map(|d| reformat_date(&d)))
        .then(|| Some(reference.display_date.clone()))
        .resolve()
        .unwrap_or_default();

    let subtitle = Chain::new()
        .then(|| ld.description())
        .then(|| meta_content(document, "og:description"))
        .resolve()
        .unwrap_or_default();

    let author = Chain::new()
        .then(|| ld.author_name())
        .then(|| Some(default_author.to_string()))
        .resolve()
        .unwrap_or_default();

    let featured_image = Chain::new()
        .then(|| ld.image_url())
        .then(|| meta_content(document, "og:image"))
        .resolve();

    PostMetadata {
        title,
        date,
        subtitle,
        author,
        featured_image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> PostReference {
        PostReference {
            title: "Listing Title".to_string(),
            display_date: "3 days ago".to_string(),
            url: "https://morning-brief.example.com/p/listing-title".to_string(),
            slug: "listing-title".to_string(),
        }
    }

    #[test]
    fn test_chain_skips_empty_values() {
        let chain = Chain::new()
            .then(|| None)
            .then(|| Some("   ".to_string()))
            .then(|| Some(" winner ".to_string()))
            .then(|| Some("loser".to_string()));
        assert_eq!(chain.resolve(), Some("winner".to_string()));
        assert_eq!(Chain::new().resolve(), None);
    }

    #[test]
    fn test_structured_data_beats_meta_and_listing() {
        let html = Html::parse_document(
            r#"<html><head>
                <meta property="og:title" content="OG Title">
                <meta property="og:description" content="OG description">
                <meta property="og:image" content="https://cdn.example/og.png">
                <script type="application/ld+json">{
                    "@type": "NewsArticle",
                    "headline": "LD Headline",
                    "datePublished": "2026-02-21T13:00:00.000Z",
                    "description": "LD description",
                    "image": {"@type": "ImageObject", "url": "https://cdn.example/ld.png"},
                    "author": [{"@type": "Person", "name": "Dana Reyes"}]
                }</script>
            </head><body><h1>Body Heading</h1></body></html>"#,
        );
        let meta = resolve(&html, &reference(), "Staff");

        assert_eq!(meta.title, "LD Headline");
        assert_eq!(meta.date, "February 21, 2026");
        assert_eq!(meta.subtitle, "LD description");
        assert_eq!(meta.author, "Dana Reyes");
        assert_eq!(meta.featured_image.as_deref(), Some("https://cdn.example/ld.png"));
    }

    #[test]
    fn test_meta_tags_beat_listing() {
        let html = Html::parse_document(
            r#"<html><head>
                <meta property="og:title" content="OG Title">
                <meta property="og:image" content="https://cdn.example/og.png">
            </head><body><h1>Body Heading</h1></body></html>"#,
        );
        let meta = resolve(&html, &reference(), "Staff");

        assert_eq!(meta.title, "OG Title");
        assert_eq!(meta.date, "3 days ago");
        assert_eq!(meta.subtitle, "");
        assert_eq!(meta.author, "Staff");
        assert_eq!(meta.featured_image.as_deref(), Some("https://cdn.example/og.png"));
    }

    #[test]
    fn test_listing_title_beats_heading_and_heading_is_last_resort() {
        let html = Html::parse_document("<html><body><h1>Body Heading</h1></body></html>");
        assert_eq!(resolve(&html, &reference(), "Staff").title, "Listing Title");

        let untitled = PostReference {
            title: String::new(),
            ..reference()
        };
        assert_eq!(resolve(&html, &untitled, "Staff").title, "Body Heading");
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let html = Html::parse_document(
            r#"<html><head>
                <script type="application/ld+json">{ "headline": "Broken", </script>
                <script type="application/ld+json">{"@graph": [
                    {"@type": "WebSite", "name": "Morning Brief"},
                    {"@type": "Article", "headline": "From Graph", "image": "https://cdn.example/g.png"}
                ]}</script>
            </head><body></body></html>"#,
        );
        let meta = resolve(&html, &reference(), "Staff");
        assert_eq!(meta.title, "From Graph");
        assert_eq!(meta.featured_image.as_deref(), Some("https://cdn.example/g.png"));
        assert_eq!(meta.author, "Staff");
    }

    #[test]
    fn test_first_block_with_field_wins() {
        let html = Html::parse_document(
            r#"<html><head>
                <script type="application/ld+json">{"description": "First description"}</script>
                <script type="application/ld+json">{"headline": "Second headline", "description": "Second description"}</script>
            </head><body></body></html>"#,
        );
        let meta = resolve(&html, &reference(), "Staff");
        assert_eq!(meta.title, "Second headline");
        assert_eq!(meta.subtitle, "First description");
    }

    #[test]
    fn test_article_published_time_fallback() {
        let html = Html::parse_document(
            r#"<html><head><meta property="article:published_time" content="2025-11-03"></head></html>"#,
        );
        assert_eq!(resolve(&html, &reference(), "Staff").date, "November 3, 2025");
    }

    #[test]
    fn test_multiline_values_collapse_to_one_line() {
        let html = Html::parse_document(
            r#"<html><head>
                <script type="application/ld+json">{"headline": "Line one\nLine two",
                    "description": "  Spread\n\n   out  ", "author": {"name": "Dana\tReyes"}}</script>
            </head><body></body></html>"#,
        );
        let meta = resolve(&html, &reference(), "Staff");
        assert_eq!(meta.title, "Line one Line two");
        assert_eq!(meta.subtitle, "Spread out");
        assert_eq!(meta.author, "Dana Reyes");
    }
}
