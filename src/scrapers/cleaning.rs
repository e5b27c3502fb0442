//! Noise and sponsor removal.
//!
//! `scraper` documents are immutable, so instead of deleting nodes we collect
//! the ids of every element that should disappear into a [`Removed`] set.
//! The Markdown converter and the link collector skip any node in that set
//! along with its whole subtree.
//!
//! What counts as noise is data ([`NoiseConfig`]): structural selectors,
//! class-attribute regexes, sponsor-text regexes and blocked link patterns.

use crate::config::{NoiseConfig, parse_selector};
use crate::error::DigestError;
use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use tracing::debug;

/// Compiled noise rules.
#[derive(Debug)]
pub struct NoiseRules {
    selectors: Vec<Selector>,
    class_patterns: Vec<Regex>,
    sponsor_selectors: Vec<Selector>,
    sponsor_patterns: Vec<Regex>,
    blocked_links: Vec<Regex>,
}

fn compile_regexes(patterns: &[String]) -> Result<Vec<Regex>, DigestError> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| DigestError::Config(format!("bad pattern `{p}`: {e}"))))
        .collect()
}

fn compile_selectors(selectors: &[String]) -> Result<Vec<Selector>, DigestError> {
    selectors.iter().map(|s| parse_selector(s)).collect()
}

impl NoiseRules {
    pub fn compile(config: &NoiseConfig) -> Result<Self, DigestError> {
        Ok(Self {
            selectors: compile_selectors(&config.selectors)?,
            class_patterns: compile_regexes(&config.class_patterns)?,
            sponsor_selectors: compile_selectors(&config.sponsor_selectors)?,
            sponsor_patterns: compile_regexes(&config.sponsor_patterns)?,
            blocked_links: compile_regexes(&config.blocked_link_patterns)?,
        })
    }

    /// Mark everything inside `region` that should not reach the output.
    ///
    /// Structural noise and noisy classes are marked first; sponsor call-outs
    /// are then matched only among the elements that survived.
    pub fn clean(&self, region: ElementRef<'_>) -> Removed {
        let mut removed = Removed::default();

        for selector in &self.selectors {
            for element in region.select(selector) {
                removed.insert(element.id());
            }
        }

        for element in region.descendants().skip(1).filter_map(ElementRef::wrap) {
            if let Some(class) = element.value().attr("class") {
                if self.class_patterns.iter().any(|re| re.is_match(class)) {
                    removed.insert(element.id());
                }
            }
        }

        for selector in &self.sponsor_selectors {
            for element in region.select(selector) {
                if removed.contains(element) {
                    continue;
                }
                let text = element.text().collect::<String>();
                if self.sponsor_patterns.iter().any(|re| re.is_match(&text)) {
                    debug!(text = %text.trim(), "Dropping sponsor block");
                    removed.insert(element.id());
                }
            }
        }

        removed
    }

    /// Whether `url` is a share or subscription endpoint.
    pub fn is_blocked_link(&self, url: &str) -> bool {
        self.blocked_links.iter().any(|re| re.is_match(url))
    }
}

/// Elements removed from a content region.
#[derive(Debug, Default)]
pub struct Removed {
    ids: HashSet<NodeId>,
}

impl Removed {
    pub fn insert(&mut self, id: NodeId) {
        self.ids.insert(id);
    }

    /// Whether `element` or any of its ancestors was removed.
    pub fn contains(&self, element: ElementRef<'_>) -> bool {
        self.ids.contains(&element.id()) || element.ancestors().any(|a| self.ids.contains(&a.id()))
    }

    /// Whether the node itself was removed (ancestors are not consulted).
    pub fn is_removed(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}
