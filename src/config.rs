//! Site registry and runtime configuration.
//!
//! Every site-specific scraping rule lives here as data: base URL, post-path
//! prefix, listing card shape, content selectors, default author and
//! pagination style. One shared pipeline consumes the compiled [`Site`].
//!
//! The built-in registry is `sites.yaml` at the crate root, embedded at
//! compile time. A user-supplied file replaces it wholesale.

use crate::error::DigestError;
use crate::scrapers::cleaning::NoiseRules;
use scraper::Selector;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

const BUILTIN_SITES: &str = include_str!("../sites.yaml");

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Fixed politeness delay between consecutive fetches.
    #[serde(default = "default_delay_ms")]
    pub request_delay_ms: u64,
    /// Browser-like identity sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub noise: NoiseConfig,
    pub sites: Vec<SiteConfig>,
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string()
}

/// Elements and links to drop from post bodies, shared by all sites.
#[derive(Debug, Clone, Deserialize)]
pub struct NoiseConfig {
    /// Structural selectors removed outright.
    pub selectors: Vec<String>,
    /// Regexes tested against an element's `class` attribute.
    pub class_patterns: Vec<String>,
    /// Elements whose text is tested against `sponsor_patterns`.
    pub sponsor_selectors: Vec<String>,
    pub sponsor_patterns: Vec<String>,
    /// Regexes for share/subscription endpoints excluded from the link inventory.
    pub blocked_link_patterns: Vec<String>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        let strings =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            selectors: strings(&[
                "script", "style", "noscript", "nav", "header", "footer", "form", "button",
                "iframe", "svg",
            ]),
            class_patterns: strings(&["(?i)subscribe|share|follow|feedback|poll|advert"]),
            sponsor_selectors: strings(&["h1, h2, h3, h4, h5, h6, p"]),
            sponsor_patterns: strings(&["(?i)presented by|sponsored by|advertisement"]),
            blocked_link_patterns: strings(&[
                r"(?i)twitter\.com/intent",
                r"(?i)x\.com/intent",
                r"(?i)facebook\.com/sharer",
                r"(?i)linkedin\.com/share",
                r"(?i)reddit\.com/submit",
                r"(?i)/subscribe(/|\?|#|$)",
            ]),
        }
    }
}

/// Per-site scraping rules as they appear in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Short identifier used on the command line.
    pub key: String,
    /// Display name used in the digest header.
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_post_prefix")]
    pub post_path_prefix: String,
    /// Author used when a post's structured data names none.
    pub default_author: String,
    /// Largest count a caller may request.
    pub max_count: usize,
    pub pagination: Pagination,
    pub listing: ListingConfig,
    #[serde(default = "default_content_selectors")]
    pub content_selectors: Vec<String>,
}

fn default_post_prefix() -> String {
    "/p/".to_string()
}

fn default_content_selectors() -> Vec<String> {
    ["#content-blocks", ".rendered-post", "main", "[role=main]"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// How a site's archive is walked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum Pagination {
    /// Sequential pages addressed by a query parameter.
    Paged {
        archive_path: String,
        #[serde(default = "default_page_param")]
        page_param: String,
        /// Serve page 1 from the site root instead of the archive endpoint.
        #[serde(default)]
        root_is_first_page: bool,
    },
    /// One fixed-size archive page.
    Single { archive_path: String },
}

fn default_page_param() -> String {
    "page".to_string()
}

/// Shape of a post card on the listing page.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// How many ancestors above the anchor make up the card (0 = the anchor).
    pub card_depth: usize,
    pub title_selector: String,
    pub date_selector: String,
}

/// Compiled listing card rules.
#[derive(Debug)]
pub struct ListingRules {
    pub card_depth: usize,
    pub anchor: Selector,
    pub title: Selector,
    pub image: Selector,
    pub date: Selector,
}

/// A site ready for the pipeline: URLs parsed, selectors and regexes compiled.
#[derive(Debug)]
pub struct Site {
    pub key: String,
    pub name: String,
    pub base_url: Url,
    pub post_path_prefix: String,
    pub default_author: String,
    pub max_count: usize,
    pub pagination: Pagination,
    pub listing: ListingRules,
    pub content_selectors: Vec<Selector>,
    pub noise: NoiseRules,
}

impl Site {
    /// Compile a site's rules together with the shared noise rules.
    pub fn compile(config: &SiteConfig, noise: &NoiseConfig) -> Result<Self, DigestError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DigestError::Config(format!("{}: bad base_url: {e}", config.key)))?;
        if config.max_count == 0 {
            return Err(DigestError::Config(format!(
                "{}: max_count must be at least 1",
                config.key
            )));
        }
        if !config.post_path_prefix.starts_with('/') {
            return Err(DigestError::Config(format!(
                "{}: post_path_prefix must start with '/'",
                config.key
            )));
        }

        let listing = ListingRules {
            card_depth: config.listing.card_depth,
            anchor: parse_selector("a[href]")?,
            title: parse_selector(&config.listing.title_selector)?,
            image: parse_selector("img[alt]")?,
            date: parse_selector(&config.listing.date_selector)?,
        };
        let content_selectors = config
            .content_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            key: config.key.clone(),
            name: config.name.clone(),
            base_url,
            post_path_prefix: config.post_path_prefix.clone(),
            default_author: config.default_author.clone(),
            max_count: config.max_count,
            pagination: config.pagination.clone(),
            listing,
            content_selectors,
            noise: NoiseRules::compile(noise)?,
        })
    }

    /// Reject counts outside `1..=max_count` before anything is fetched.
    pub fn check_count(&self, count: usize) -> Result<(), DigestError> {
        if count == 0 || count > self.max_count {
            return Err(DigestError::CountOutOfRange {
                site: self.key.clone(),
                count,
                max: self.max_count,
            });
        }
        Ok(())
    }

    /// Host of the site without a leading `www.`.
    pub fn host(&self) -> &str {
        let host = self.base_url.host_str().unwrap_or_default();
        host.strip_prefix("www.").unwrap_or(host)
    }
}

/// Parse a CSS selector, turning failures into configuration errors.
pub fn parse_selector(selector: &str) -> Result<Selector, DigestError> {
    Selector::parse(selector)
        .map_err(|e| DigestError::Config(format!("bad selector `{selector}`: {e}")))
}

impl Config {
    /// The registry compiled into the binary.
    pub fn builtin() -> Result<Self, DigestError> {
        Self::from_yaml(BUILTIN_SITES)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, DigestError> {
        let config: Config =
            serde_yaml::from_str(yaml).map_err(|e| DigestError::Config(e.to_string()))?;
        if config.sites.is_empty() {
            return Err(DigestError::Config("no sites configured".to_string()));
        }
        Ok(config)
    }

    /// Load from `path` when given, else fall back to the built-in registry.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, DigestError> {
        match path {
            Some(path) => {
                let yaml = tokio::fs::read_to_string(path).await?;
                let config = Self::from_yaml(&yaml)?;
                info!(path, sites = config.sites.len(), "Loaded site configuration");
                Ok(config)
            }
            None => Self::builtin(),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Find and compile the site registered under `key`.
    pub fn site(&self, key: &str) -> Result<Site, DigestError> {
        let site = self
            .sites
            .iter()
            .find(|s| s.key == key)
            .ok_or_else(|| DigestError::UnknownSite(key.to_string()))?;
        Site::compile(site, &self.noise)
    }
}
