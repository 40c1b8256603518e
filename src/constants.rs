// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you how the content
//! layer talks to Notion, how hard it leans on secondary hosts, and how long
//! derived data stays trustworthy.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// Root of the Notion REST API.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

/// Value sent in the `Notion-Version` header.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100. Listings and block children both use the
/// maximum unless a caller asks for less.
pub const NOTION_API_PAGE_SIZE: u32 = 100;

/// Maximum nesting depth when materializing a page's block tree.
///
/// Real pages rarely nest beyond a handful of toggles or columns. Anything
/// deeper than this is treated as pathological and left unexpanded.
pub const NOTION_MAX_BLOCK_DEPTH: usize = 50;

/// How many leaf fetches (children pages, image probes, unfurls) may be in
/// flight at once while materializing one tree.
pub const BLOCK_FETCH_CONCURRENCY: usize = 2;

/// The blog's content database.
pub const DEFAULT_DATABASE_ID: &str = "392acd2f7b5849e784cc4b0009aeabf5";

// ---------------------------------------------------------------------------
// Content database schema
// ---------------------------------------------------------------------------

/// Property names the blog database is expected to carry.
pub mod properties {
    pub const PATH: &str = "Path";
    pub const NAME: &str = "Name";
    pub const AUTHOR: &str = "Author";
    pub const DESCRIPTION: &str = "Description";
    pub const TAGS: &str = "Tags";
    pub const PUBLIC: &str = "Public";
    pub const PUBLISHED: &str = "Published";
}

// ---------------------------------------------------------------------------
// Secondary fetches
// ---------------------------------------------------------------------------

/// Bookmark unfurls give up after this long.
pub const UNFURL_TIMEOUT: Duration = Duration::from_millis(3000);

/// Redirects followed by a bookmark unfurl before giving up.
pub const UNFURL_MAX_REDIRECTS: usize = 3;

/// Upper bound on bytes read while probing an image header.
///
/// Most formats declare their size in the first few hundred bytes; JPEGs
/// with large EXIF blocks are the reason this is not smaller.
pub const IMAGE_PROBE_MAX_BYTES: usize = 256 * 1024;

/// How long a probed image URL is advertised as valid.
///
/// Notion-hosted files use signed URLs; the renderer refreshes an image
/// through the single-block endpoint once this window has passed.
pub const IMAGE_CACHING_TIME: Duration = Duration::from_secs(86_400);

/// User agent presented to third-party hosts during unfurls and probes.
pub const FETCH_USER_AGENT: &str = concat!("notion2blog/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Site presentation defaults
// ---------------------------------------------------------------------------

/// Posts shown per listing page.
pub const POSTS_PER_PAGE: usize = 5;

/// Related posts shown under a single post.
pub const PREVIEW_POSTS: usize = 3;

/// Tags shown in "popular" lists unless a caller asks otherwise.
pub const POPULAR_TAGS: usize = 10;

/// Related tags shown on a tag page.
pub const RELATED_TAGS: usize = 5;

/// Window counted as "recent" by post statistics.
pub const RECENT_POSTS_WINDOW_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// In-process memoization
// ---------------------------------------------------------------------------

/// How long a memoized listing or block tree is reused without asking the
/// cache layer again.
pub const MEMO_WINDOW: Duration = Duration::from_secs(60);

/// Distinct argument sets remembered by each memo.
pub const MEMO_CAPACITY: usize = 512;

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
