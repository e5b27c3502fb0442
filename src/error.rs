//! Error types for the digest pipeline.
//!
//! The taxonomy follows how far a failure is allowed to travel:
//!
//! - [`FetchError`]: a single HTTP request failed (non-success status or transport).
//! - [`ParseError`]: an embedded JSON-LD block was malformed. Always recovered
//!   locally by skipping the block; never surfaced to the caller.
//! - [`ExtractionError`]: a post could not be extracted. The pipeline turns it
//!   into a placeholder post so one bad post never aborts the digest.
//! - [`DigestError`]: the whole request failed (bad input, bad config, or no
//!   listings could be discovered).

use crate::models::PostReference;
use reqwest::StatusCode;
use thiserror::Error;

/// A failed markup fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status { status: StatusCode, url: String },

    /// The request never produced a readable body.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A structured-data block that could not be parsed as JSON.
#[derive(Error, Debug)]
#[error("malformed JSON-LD block: {0}")]
pub struct ParseError(#[from] pub serde_json::Error);

/// Extraction of a single post failed.
#[derive(Error, Debug)]
#[error("could not extract {}: {cause}", .reference.url)]
pub struct ExtractionError {
    /// The reference whose post could not be extracted.
    pub reference: PostReference,
    #[source]
    pub cause: FetchError,
}

/// A digest request that cannot produce any output.
#[derive(Error, Debug)]
pub enum DigestError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown site `{0}`")]
    UnknownSite(String),

    #[error("count {count} is out of range for {site} (expected 1..={max})")]
    CountOutOfRange {
        site: String,
        count: usize,
        max: usize,
    },

    /// A listing page could not be fetched, so no posts could be discovered.
    #[error("listing fetch failed: {0}")]
    Listing(#[from] FetchError),

    #[error("no posts found in the {site} archive")]
    NoListings { site: String },

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
