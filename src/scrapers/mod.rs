//! Newsletter scraping: listing discovery and post extraction.
//!
//! Every site runs through the same two-phase pipeline, driven by its
//! [`Site`](crate::config::Site) rules rather than per-site code:
//!
//! 1. **Indexing**: [`paginator`] walks the archive and [`listing`] turns each
//!    page into post references
//! 2. **Fetching**: [`content`] fetches each post and extracts metadata
//!    ([`metadata`]), strips noise ([`cleaning`]) and converts the body to
//!    Markdown ([`markdown`])
//!
//! # Site differences
//!
//! | Concern | Configured by |
//! |---------|---------------|
//! | Post URLs | `post_path_prefix` |
//! | Card shape | `listing.card_depth`, `title_selector`, `date_selector` |
//! | Archive walk | `pagination` (`paged` or `single`) |
//! | Body region | `content_selectors` |
//! | Missing author | `default_author` |

pub mod cleaning;
pub mod content;
pub mod listing;
pub mod markdown;
pub mod metadata;
pub mod paginator;
