//! Command-line interface definitions for Newsletter Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Each configured site is one tool: pick it by key and ask for a count.

use clap::Parser;

/// Command-line arguments for the Newsletter Digest application.
///
/// # Examples
///
/// ```sh
/// # Print the five latest Morning Brief posts as one Markdown digest
/// newsletter_digest morning-brief -n 5
///
/// # Write Markdown and JSON files instead of printing
/// newsletter_digest field-notes -n 9 -m ./markdown -j ./json
///
/// # Use a custom site registry
/// newsletter_digest --config ./sites.yaml --list-sites
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Site key from the registry (see --list-sites)
    #[arg(required_unless_present = "list_sites")]
    pub site: Option<String>,

    /// Number of latest posts to include
    #[arg(short = 'n', long, default_value_t = 5)]
    pub count: usize,

    /// Optional path to a sites.yaml file replacing the built-in registry
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output directory for the Markdown digest (prints to stdout when absent)
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// Output directory for the JSON digest
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Override the delay between consecutive requests, in milliseconds
    #[arg(long, env = "DIGEST_DELAY_MS")]
    pub delay_ms: Option<u64>,

    /// List configured sites and their count limits, then exit
    #[arg(long)]
    pub list_sites: bool,
}
