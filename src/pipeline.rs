//! The digest pipeline: discover, extract, collect.
//!
//! One sequential flow per request. A fresh [`Throttled`] fetcher is created
//! for every build so the politeness delay spaces all of its fetches (listing
//! pages and post pages alike) and nothing is shared between builds.

use crate::config::Site;
use crate::error::DigestError;
use crate::fetch::{Fetch, Throttled};
use crate::models::{PostContent, PostOutcome};
use crate::scrapers::{content, paginator};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Collect `count` posts from `site`, one at a time.
///
/// The returned posts are in listing order and there is exactly one per
/// discovered reference: posts that fail to extract come back as placeholders.
///
/// # Errors
///
/// - [`DigestError::CountOutOfRange`] before any fetch
/// - [`DigestError::Listing`] if a listing page cannot be fetched
/// - [`DigestError::NoListings`] if the archive has no posts at all
#[instrument(level = "info", skip_all, fields(site = %site.key, count))]
pub async fn collect_posts<F: Fetch>(
    fetcher: &F,
    site: &Site,
    count: usize,
    delay: Duration,
) -> Result<Vec<PostContent>, DigestError> {
    site.check_count(count)?;

    let fetcher = Throttled::new(fetcher, delay);
    let references = paginator::collect(&fetcher, site, count).await?;
    if references.is_empty() {
        return Err(DigestError::NoListings {
            site: site.key.clone(),
        });
    }

    let mut posts = Vec::with_capacity(references.len());
    for (index, reference) in references.into_iter().enumerate() {
        let extracted = content::extract(&fetcher, site, &reference).await;
        let outcome = match extracted {
            Ok(post) => PostOutcome::Fetched(post),
            Err(e) => {
                warn!(index, url = %reference.url, error = %e, "Post extraction failed; using placeholder");
                PostOutcome::Failed {
                    reason: e.cause.to_string(),
                    reference,
                }
            }
        };
        posts.push(outcome.into_content(&site.default_author));
    }

    let failed = posts.iter().filter(|p| p.is_placeholder()).count();
    info!(total = posts.len(), failed, "Collected posts");
    Ok(posts)
}
