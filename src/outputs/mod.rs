//! Output generation for finished digests.
//!
//! # Submodules
//!
//! - [`markdown`]: Renders posts into the single Markdown digest document
//! - [`json`]: Writes the same posts as JSON for programmatic consumers
//!
//! # Output Structure
//!
//! ```text
//! markdown_output_dir/
//! ├── 2026-02-21_morning-brief.md
//! └── 2026-02-21_field-notes.md
//!
//! json_output_dir/
//! └── 2026-02-21/
//!     ├── morning-brief.json
//!     └── field-notes.json
//! ```
//!
//! Without an output directory the Markdown digest is printed to stdout.

pub mod json;
pub mod markdown;
