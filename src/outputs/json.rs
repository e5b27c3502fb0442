//! JSON output for programmatic consumers.
//!
//! Files are organized by compile date, one file per site:
//! ```text
//! json_output_dir/
//! └── 2026-02-21/
//!     └── morning-brief.json
//! ```

use crate::error::DigestError;
use crate::models::Digest;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`Digest`] to `{json_output_dir}/{date}/{site}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, site = %digest.site))]
pub async fn write_digest(digest: &Digest, json_output_dir: &str) -> Result<PathBuf, DigestError> {
    let json = serde_json::to_string_pretty(digest)?;

    let dir = PathBuf::from(json_output_dir).join(digest.compiled_on.to_string());
    info!(dir = %dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = dir.join(format!("{}.json", digest.site));
    fs::write(&path, json).await?;
    info!(path = %path.display(), posts = digest.posts.len(), "Wrote JSON digest");
    Ok(path)
}
