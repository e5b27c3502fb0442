//! # Newsletter Digest
//!
//! Collects the latest posts from public newsletter archives and converts
//! them into one clean Markdown document for a downstream summarizer.
//!
//! ## Features
//!
//! - Discovers post URLs from paged or single-page archives
//! - Recovers metadata from JSON-LD with meta tag fallbacks
//! - Strips navigation, subscribe widgets and sponsor call-outs
//! - Converts post bodies to Markdown and inventories outbound links
//! - Writes the digest to stdout, a Markdown file, and optionally JSON
//!
//! ## Usage
//!
//! ```sh
//! newsletter_digest morning-brief -n 7
//! ```
//!
//! ## Architecture
//!
//! The application follows a sequential pipeline:
//! 1. **Indexing**: Walk the site's archive for post references
//! 2. **Fetching**: Fetch and extract each post, one at a time with a fixed delay
//! 3. **Output**: Render the Markdown digest (and JSON, when asked)

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::Cli;
use config::Config;
use fetch::HttpFetcher;
use models::Digest;
use outputs::{json, markdown};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr, so stdout carries only the digest) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = Config::load(args.config.as_deref()).await?;

    if args.list_sites {
        for site in &config.sites {
            println!("{}\t{}\t1..={}\t{}", site.key, site.name, site.max_count, site.base_url);
        }
        return Ok(());
    }

    let Some(site_key) = args.site.as_deref() else {
        return Err("a site key is required".into());
    };
    let site = config.site(site_key)?;
    site.check_count(args.count)?;

    // Early check: output dirs must be writable before we spend time fetching
    for dir in [&args.markdown_output_dir, &args.json_output_dir].into_iter().flatten() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let delay = args
        .delay_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or_else(|| config.delay());
    let fetcher = HttpFetcher::new(&config.user_agent)?;

    info!(site = %site.key, count = args.count, delay_ms = delay.as_millis() as u64, "Building digest");
    let posts = match pipeline::collect_posts(&fetcher, &site, args.count, delay).await {
        Ok(posts) => posts,
        Err(e) => {
            error!(site = %site.key, error = %e, "Digest failed");
            return Err(e.into());
        }
    };

    let compiled_on = Local::now().date_naive();
    let md = markdown::format_digest(&site.name, &posts, compiled_on);

    match &args.markdown_output_dir {
        Some(dir) => {
            let path = format!("{}/{}_{}.md", dir.trim_end_matches('/'), compiled_on, site.key);
            tokio::fs::write(&path, &md).await?;
            info!(%path, "Wrote Markdown digest");
        }
        None => print!("{md}"),
    }

    if let Some(dir) = &args.json_output_dir {
        let digest = Digest {
            site: site.key.clone(),
            site_name: site.name.clone(),
            compiled_on,
            posts,
        };
        json::write_digest(&digest, dir).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
