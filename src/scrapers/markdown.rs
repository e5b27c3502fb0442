//! HTML to Markdown conversion for cleaned content regions.
//!
//! The region's children are re-serialized to HTML with every node in the
//! [`Removed`] set left out, then handed to `htmd`. The serializer also does
//! the rewriting `htmd` cannot know about:
//!
//! | HTML | Before conversion |
//! |------|-------------------|
//! | `img` without `src` | dropped |
//! | `img`, `a` | `src`/`href` resolved against the post URL |
//! | `a` without visible text | dropped |
//! | `a` to `#...` or `javascript:` | unwrapped to its text |
//! | `ol` | emitted as `ul` so every list uses `- ` bullets |
//!
//! A final pass trims trailing spaces and collapses runs of blank lines,
//! leaving fenced code untouched.

use super::cleaning::Removed;
use crate::utils::{collapse_whitespace, resolve_href};
use ego_tree::NodeRef;
use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, Options};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Node};
use tracing::debug;
use url::Url;

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)-[ \t]+").unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Convert the children of `region` to normalized Markdown.
pub fn to_markdown(region: ElementRef<'_>, removed: &Removed, page_url: &Url) -> String {
    let serializer = Serializer { removed, page_url };
    let mut html = String::new();
    for child in region.children() {
        serializer.node(child, &mut html);
    }
    if html.trim().is_empty() {
        return String::new();
    }

    let markdown = converter().convert(&html).unwrap_or_else(|e| {
        debug!(error = %e, "Markdown conversion failed, keeping plain text");
        region.text().collect::<String>()
    });
    normalize(&markdown)
}

fn converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            code_block_style: CodeBlockStyle::Fenced,
            ..Default::default()
        })
        .build()
}

/// Trim line ends, collapse 3+ newlines to one blank line, trim the result.
///
/// Lines inside fenced code blocks are kept verbatim. Outside them, list
/// markers are reduced to a single `- `.
pub fn normalize(raw: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;
    let mut blank_run = 0;

    for line in raw.lines() {
        let is_fence = line.trim_start().starts_with("```");
        if in_fence && !is_fence {
            out.push(line.to_string());
            continue;
        }
        if is_fence {
            in_fence = !in_fence;
        }

        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(LIST_MARKER.replace(line, "$1- ").into_owned());
    }

    out.join("\n").trim().to_string()
}

/// Writes the surviving part of a region back out as HTML.
struct Serializer<'r> {
    removed: &'r Removed,
    page_url: &'r Url,
}

impl Serializer<'_> {
    fn node(&self, node: NodeRef<'_, Node>, out: &mut String) {
        if self.removed.is_removed(node.id()) {
            return;
        }
        if let Some(element) = ElementRef::wrap(node) {
            self.element(element, out);
            return;
        }
        if let Node::Text(text) = node.value() {
            out.push_str(&escape(text, false));
        }
    }

    fn children(&self, node: NodeRef<'_, Node>, out: &mut String) {
        for child in node.children() {
            self.node(child, out);
        }
    }

    /// Text that would survive conversion, used to spot empty anchors.
    fn visible_text(&self, node: NodeRef<'_, Node>) -> String {
        node.children()
            .filter(|child| !self.removed.is_removed(child.id()))
            .map(|child| match child.value() {
                Node::Text(text) => (**text).to_owned(),
                Node::Element(_) => self.visible_text(child),
                _ => String::new(),
            })
            .collect()
    }

    fn element(&self, element: ElementRef<'_>, out: &mut String) {
        let tag = element.value().name();
        let mut attrs = element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>();

        match tag {
            "img" => {
                let Some(src) = element.value().attr("src").map(str::trim).filter(|s| !s.is_empty())
                else {
                    return;
                };
                let src = resolve_href(self.page_url, src).unwrap_or_else(|| src.to_string());
                set_attr(&mut attrs, "src", src);
            }
            "a" => {
                if collapse_whitespace(&self.visible_text(*element)).is_empty() {
                    return;
                }
                let href = element.value().attr("href").map(str::trim).unwrap_or_default();
                if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
                    self.children(*element, out);
                    return;
                }
                let href = resolve_href(self.page_url, href).unwrap_or_else(|| href.to_string());
                set_attr(&mut attrs, "href", href);
            }
            _ => {}
        }
        let name = if tag == "ol" { "ul" } else { tag };

        out.push('<');
        out.push_str(name);
        for (key, value) in &attrs {
            out.push_str(&format!(" {key}=\"{}\"", escape(value, true)));
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&name) {
            return;
        }
        self.children(*element, out);
        out.push_str(&format!("</{name}>"));
    }
}

fn set_attr(attrs: &mut [(String, String)], key: &str, value: String) {
    if let Some(slot) = attrs.iter_mut().find(|(k, _)| k == key) {
        slot.1 = value;
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn convert(fragment: &str) -> String {
        let html = Html::parse_document(&format!("<body><div id=\"r\">{fragment}</div></body>"));
        let region = html.select(&Selector::parse("#r").unwrap()).next().unwrap();
        let page = Url::parse("https://morning-brief.example.com/p/post").unwrap();
        to_markdown(region, &Removed::default(), &page)
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let md = convert("<h1>Top</h1><p>First   paragraph\n with wrap.</p><h3>Sub</h3><p>Second.</p>");
        assert_eq!(md, "# Top\n\nFirst paragraph with wrap.\n\n### Sub\n\nSecond.");
    }

    #[test]
    fn test_lists_use_uniform_bullets() {
        let md = convert("<ol><li>One</li><li>Two<ul><li>Nested</li></ul></li></ol><ul><li>Three</li></ul>");
        let lines = md.lines().filter(|l| !l.trim().is_empty()).collect::<Vec<_>>();

        assert_eq!(lines[0], "- One");
        assert_eq!(lines[1], "- Two");
        assert!(lines[2].starts_with(' '));
        assert_eq!(lines[2].trim_start(), "- Nested");
        assert_eq!(lines[3], "- Three");
        assert!(!md.contains("1."));
    }

    #[test]
    fn test_code_blocks_are_fenced() {
        let md = convert(
            "<p>Run:</p><pre><code class=\"language-rust\">fn main() {\n    println!(\"hi\");\n}</code></pre><p>Use <code>cargo</code> daily.</p>",
        );
        assert!(md.starts_with("Run:\n\n```"));
        assert!(md.contains("fn main() {\n    println!(\"hi\");\n}\n```"));
        assert!(md.ends_with("Use `cargo` daily."));
    }

    #[test]
    fn test_images_need_src() {
        let md = convert(r#"<img src="/img/chart.png" alt="Chart"><img src="" alt="Ghost"><img alt="No src">"#);
        assert_eq!(md, "![Chart](https://morning-brief.example.com/img/chart.png)");
    }

    #[test]
    fn test_empty_anchors_are_dropped() {
        let md = convert(
            r##"<p>Read <a href="https://external.example/story">the story</a>.<a href="https://external.example/x"> </a></p><p><a href="#top">Back to top</a></p>"##,
        );
        assert_eq!(md, "Read [the story](https://external.example/story).\n\nBack to top");
        assert!(!md.contains("[]"));
    }

    #[test]
    fn test_relative_links_resolve_against_post() {
        let md = convert(r#"<p>See <a href="/p/older">the older post</a>.</p>"#);
        assert_eq!(md, "See [the older post](https://morning-brief.example.com/p/older).");
    }

    #[test]
    fn test_emphasis_and_blockquote() {
        let md = convert("<p>A <strong>bold</strong> claim.</p><blockquote><p>Quoted line.</p></blockquote>");
        assert_eq!(md, "A **bold** claim.\n\n> Quoted line.");
    }

    #[test]
    fn test_blank_runs_collapse() {
        assert_eq!(normalize("a\n\n\n\n\nb  \n\n\n c\n"), "a\n\nb\n\n c");
        let md = convert("<div><p>a</p><div></div><div> </div><p>b</p></div>");
        assert_eq!(md, "a\n\nb");
    }

    #[test]
    fn test_fenced_code_is_left_alone() {
        let raw = "Intro\n\n```\na  \n\n\n\nb\n-   not a bullet\n```\n\n\n\nOutro";
        assert_eq!(
            normalize(raw),
            "Intro\n\n```\na  \n\n\n\nb\n-   not a bullet\n```\n\nOutro"
        );
    }

    #[test]
    fn test_removed_nodes_are_skipped() {
        let html = Html::parse_document(r#"<body><div id="r"><p>Keep</p><p id="x">Drop <b>me</b></p></div></body>"#);
        let region = html.select(&Selector::parse("#r").unwrap()).next().unwrap();
        let dropped = html.select(&Selector::parse("#x").unwrap()).next().unwrap();
        let mut removed = Removed::default();
        removed.insert(dropped.id());
        let page = Url::parse("https://morning-brief.example.com/p/post").unwrap();
        assert_eq!(to_markdown(region, &removed, &page), "Keep");
    }

    #[test]
    fn test_anchor_with_only_removed_text_is_dropped() {
        let html = Html::parse_document(
            r#"<body><div id="r"><p>Body <a href="https://external.example/x"><span id="x">Share</span></a></p></div></body>"#,
        );
        let region = html.select(&Selector::parse("#r").unwrap()).next().unwrap();
        let dropped = html.select(&Selector::parse("#x").unwrap()).next().unwrap();
        let mut removed = Removed::default();
        removed.insert(dropped.id());
        let page = Url::parse("https://morning-brief.example.com/p/post").unwrap();
        assert_eq!(to_markdown(region, &removed, &page), "Body");
    }

    #[test]
    fn test_text_is_escaped_before_conversion() {
        let md = convert("<p>Fish &amp; chips &lt;cheap&gt;</p>");
        assert!(md.contains("Fish & chips"));
        assert!(md.contains("cheap"));
    }
}
