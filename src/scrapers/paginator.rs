//! Listing pagination.
//!
//! Walks a site's archive one page at a time until either enough references
//! have been collected or a page contributes nothing new. Single-page
//! archives are fetched once and sliced.
//!
//! Pacing is the fetcher's job: the pipeline hands in a [`Throttled`]
//! fetcher, which delays every fetch after the first.
//!
//! [`Throttled`]: crate::fetch::Throttled

use super::listing::extract_listings;
use crate::config::{Pagination, Site};
use crate::error::FetchError;
use crate::fetch::Fetch;
use crate::models::PostReference;
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use url::Url;

/// Collect up to `count` unique post references from the site's archive.
///
/// Returns fewer than `count` when the archive runs out; that is not an error.
/// A failed listing fetch is.
#[instrument(level = "info", skip_all, fields(site = %site.key, count))]
pub async fn collect<F: Fetch>(
    fetcher: &F,
    site: &Site,
    count: usize,
) -> Result<Vec<PostReference>, FetchError> {
    let references = match &site.pagination {
        Pagination::Single { archive_path } => {
            let url = archive_url(&site.base_url, archive_path, None);
            let markup = fetcher.fetch(&url).await?;
            let mut references =
                extract_listings(&markup, &site.base_url, &site.post_path_prefix, &site.listing);
            references.truncate(count);
            references
        }
        Pagination::Paged {
            archive_path,
            page_param,
            root_is_first_page,
        } => {
            let mut references: Vec<PostReference> = Vec::new();
            let mut seen = HashSet::new();
            let mut page = 1usize;

            while references.len() < count {
                let url = if page == 1 && *root_is_first_page {
                    site.base_url.to_string()
                } else {
                    archive_url(&site.base_url, archive_path, Some((page_param, page)))
                };
                let markup = fetcher.fetch(&url).await?;
                let found =
                    extract_listings(&markup, &site.base_url, &site.post_path_prefix, &site.listing);

                let before = references.len();
                references.extend(found.into_iter().filter(|r| seen.insert(r.slug.clone())));
                let added = references.len() - before;
                debug!(page, added, total = references.len(), "Walked listing page");

                if added == 0 {
                    debug!(page, "Archive exhausted");
                    break;
                }
                page += 1;
            }

            references.truncate(count);
            references
        }
    };

    info!(found = references.len(), "Collected post references");
    Ok(references)
}

/// `{base}{archive_path}`, optionally with a page query parameter.
fn archive_url(base: &Url, archive_path: &str, page: Option<(&str, usize)>) -> String {
    let mut url = base.clone();
    url.set_path(archive_path);
    if let Some((param, number)) = page {
        url.query_pairs_mut()
            .clear()
            .append_pair(param, &number.to_string());
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetch::testing::FakeFetcher;

    fn cards(slugs: &[&str]) -> String {
        slugs
            .iter()
            .map(|s| format!(r#"<div><div><a href="/p/{s}"><h2>{s}</h2></a></div></div>"#))
            .collect()
    }

    fn field_cards(slugs: &[&str]) -> String {
        slugs
            .iter()
            .map(|s| format!(r#"<a href="/p/{s}"><h3>{s}</h3><p>Jan 1</p></a>"#))
            .collect()
    }

    const ROOT: &str = "https://morning-brief.example.com/";
    const PAGE2: &str = "https://morning-brief.example.com/archive?page=2";
    const PAGE3: &str = "https://morning-brief.example.com/archive?page=3";

    #[test]
    fn test_archive_url() {
        let base = Url::parse("https://morning-brief.example.com").unwrap();
        assert_eq!(archive_url(&base, "/archive", Some(("page", 4))), "https://morning-brief.example.com/archive?page=4");
        assert_eq!(archive_url(&base, "/archive", None), "https://morning-brief.example.com/archive");
    }

    #[tokio::test]
    async fn test_stops_once_count_reached() {
        let site = Config::builtin().unwrap().site("morning-brief").unwrap();
        let fake = FakeFetcher::new()
            .page(ROOT, cards(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]));

        let refs = collect(&fake, &site, 7).await.unwrap();
        assert_eq!(refs.len(), 7);
        assert_eq!(refs[0].slug, "a");
        assert_eq!(refs[6].slug, "g");
        assert_eq!(fake.urls(), vec![ROOT.to_string()]);
    }

    #[tokio::test]
    async fn test_walks_pages_and_stops_on_empty_page() {
        let site = Config::builtin().unwrap().site("morning-brief").unwrap();
        let fake = FakeFetcher::new()
            .page(ROOT, cards(&["a", "b", "c"]))
            // Short page with one repeat still counts as progress.
            .page(PAGE2, cards(&["c", "d"]))
            .page(PAGE3, "<html><body><p>No more posts</p></body></html>");

        let refs = collect(&fake, &site, 10).await.unwrap();
        let slugs: Vec<_> = refs.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b", "c", "d"]);
        assert_eq!(fake.urls(), vec![ROOT, PAGE2, PAGE3]);
    }

    #[tokio::test]
    async fn test_repeated_page_ends_walk() {
        let site = Config::builtin().unwrap().site("morning-brief").unwrap();
        let fake = FakeFetcher::new()
            .page(ROOT, cards(&["a", "b"]))
            .page(PAGE2, cards(&["a", "b"]));

        let refs = collect(&fake, &site, 5).await.unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(fake.urls().len(), 2);
    }

    #[tokio::test]
    async fn test_results_are_unique_and_bounded() {
        let site = Config::builtin().unwrap().site("morning-brief").unwrap();
        let fake = FakeFetcher::new()
            .page(ROOT, cards(&["a", "b", "a", "c"]))
            .page(PAGE2, cards(&["c", "d", "e", "f"]));

        for count in 1..=6 {
            let refs = collect(&fake, &site, count).await.unwrap();
            assert!(refs.len() <= count);
            let unique: HashSet<_> = refs.iter().map(|r| r.url.clone()).collect();
            assert_eq!(unique.len(), refs.len());
        }
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let site = Config::builtin().unwrap().site("morning-brief").unwrap();
        let fake = FakeFetcher::new();
        assert!(collect(&fake, &site, 3).await.is_err());
    }

    #[tokio::test]
    async fn test_single_page_archive_is_sliced() {
        let site = Config::builtin().unwrap().site("field-notes").unwrap();
        let fake = FakeFetcher::new().page(
            "https://field-notes.example.com/archive",
            field_cards(&["one", "two", "three", "four"]),
        );

        let refs = collect(&fake, &site, 2).await.unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].slug, "two");
        assert_eq!(fake.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_single_page_archive_shorter_than_count() {
        let site = Config::builtin().unwrap().site("field-notes").unwrap();
        let fake = FakeFetcher::new().page(
            "https://field-notes.example.com/archive",
            field_cards(&["one", "two", "three"]),
        );

        let refs = collect(&fake, &site, 9).await.unwrap();
        let slugs = refs.iter().map(|r| r.slug.as_str()).collect::<Vec<_>>();
        assert_eq!(slugs, vec!["one", "two", "three"]);
        assert_eq!(fake.urls().len(), 1);
    }
}
