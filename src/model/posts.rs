//! Pure computations over an already-fetched set of posts.
//!
//! Nothing in here performs I/O. The cache layer and the aggregators feed
//! these functions whatever listing they already hold.

use super::PageMeta;
use crate::constants::RECENT_POSTS_WINDOW_DAYS;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A content tag with the number of posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Headline numbers about the blog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostStats {
    pub total_posts: usize,
    pub total_tags: usize,
    /// Posts published within the recent window.
    pub recent_posts_count: usize,
    /// Newest upstream edit across all posts.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Newest first. Equal timestamps keep their listing order.
pub fn sort_by_published_desc(posts: &mut [PageMeta]) {
    posts.sort_by(|a, b| b.published.cmp(&a.published));
}

/// Every distinct tag, alphabetically.
pub fn unique_tags(posts: &[PageMeta]) -> Vec<String> {
    let mut tags: Vec<String> = posts
        .iter()
        .flat_map(|post| post.tags.iter().cloned())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    tags.sort();
    tags
}

/// Tag frequencies, most used first, ties broken alphabetically.
pub fn tag_counts<'a>(posts: impl IntoIterator<Item = &'a PageMeta>) -> Vec<TagCount> {
    count_tags(posts, |_| true)
}

/// The `limit` most used tags.
pub fn popular_tags(posts: &[PageMeta], limit: usize) -> Vec<TagCount> {
    let mut counts = tag_counts(posts);
    counts.truncate(limit);
    counts
}

/// Tags that co-occur with `tag` across `tag_posts`, most frequent first.
pub fn related_tags(tag_posts: &[PageMeta], tag: &str, limit: usize) -> Vec<TagCount> {
    let mut counts = count_tags(tag_posts, |candidate| candidate != tag);
    counts.truncate(limit);
    counts
}

fn count_tags<'a>(
    posts: impl IntoIterator<Item = &'a PageMeta>,
    keep: impl Fn(&str) -> bool,
) -> Vec<TagCount> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for post in posts {
        for tag in post.tags.iter().filter(|t| keep(t)) {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    counts
}

/// Candidates related to `current`: deduplicated by id, never `current`
/// itself, newest first, at most `limit`.
pub fn related_posts(current: &PageMeta, candidates: Vec<PageMeta>, limit: usize) -> Vec<PageMeta> {
    let mut seen = HashSet::new();
    let mut related: Vec<PageMeta> = candidates
        .into_iter()
        .filter(|post| post.id != current.id)
        .filter(|post| seen.insert(post.id.clone()))
        .collect();
    sort_by_published_desc(&mut related);
    related.truncate(limit);
    related
}

/// Case-insensitive substring search over title, description and tags.
///
/// A blank term matches everything.
pub fn search_posts(posts: &[PageMeta], term: &str) -> Vec<PageMeta> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return posts.to_vec();
    }

    posts
        .iter()
        .filter(|post| {
            post.title.to_lowercase().contains(&needle)
                || post.description.to_lowercase().contains(&needle)
                || post.tags.iter().any(|t| t.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

pub fn post_stats(posts: &[PageMeta], now: DateTime<Utc>) -> PostStats {
    let cutoff = now - Duration::days(RECENT_POSTS_WINDOW_DAYS);

    PostStats {
        total_posts: posts.len(),
        total_tags: unique_tags(posts).len(),
        recent_posts_count: posts.iter().filter(|p| p.published >= cutoff).count(),
        last_updated: posts.iter().map(|p| p.updated).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageId;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn post(n: u8, day: u32, tags: &[&str]) -> PageMeta {
        let when = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
        PageMeta {
            id: PageId::parse(&format!("{:032x}", n)).unwrap(),
            path: format!("post-{n}"),
            title: format!("Post {n}"),
            author: "Ada".to_string(),
            description: format!("About number {n}"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            public: true,
            published: when,
            updated: when,
        }
    }

    #[test]
    fn test_unique_tags_sorted() {
        let posts = vec![post(1, 1, &["rust", "web"]), post(2, 2, &["async", "rust"])];
        assert_eq!(unique_tags(&posts), vec!["async", "rust", "web"]);
    }

    #[test]
    fn test_popular_tags_by_count_then_name() {
        let posts = vec![
            post(1, 1, &["web", "rust"]),
            post(2, 2, &["rust", "async"]),
            post(3, 3, &["rust", "web"]),
            post(4, 4, &["cli"]),
        ];
        let popular = popular_tags(&posts, 3);
        let names: Vec<_> = popular.iter().map(|t| (t.tag.as_str(), t.count)).collect();
        assert_eq!(names, vec![("rust", 3), ("web", 2), ("async", 1)]);
    }

    #[test]
    fn test_related_tags_exclude_the_tag_itself() {
        let posts = vec![
            post(1, 1, &["rust", "web"]),
            post(2, 2, &["rust", "web", "wasm"]),
            post(3, 3, &["rust", "cli"]),
        ];
        let related = related_tags(&posts, "rust", 5);
        let names: Vec<_> = related.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, vec!["web", "cli", "wasm"]);
    }

    #[test]
    fn test_related_posts_dedupes_and_excludes_current() {
        let current = post(1, 1, &["rust"]);
        let candidates = vec![
            post(2, 2, &["rust"]),
            post(1, 1, &["rust"]),
            post(3, 5, &["rust"]),
            post(2, 2, &["rust"]),
            post(4, 4, &["rust"]),
        ];
        let related = related_posts(&current, candidates, 2);
        let paths: Vec<_> = related.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["post-3", "post-4"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_blank_matches_all() {
        let posts = vec![
            post(1, 1, &["Rust"]),
            post(2, 2, &["go"]),
            post(3, 3, &[]),
        ];
        assert_eq!(search_posts(&posts, "  ").len(), 3);
        assert_eq!(search_posts(&posts, "rust").len(), 1);
        assert_eq!(search_posts(&posts, "NUMBER 3")[0].path, "post-3");
        assert!(search_posts(&posts, "haskell").is_empty());
    }

    #[test]
    fn test_post_stats_counts_recent_window() {
        let posts = vec![post(1, 1, &["a"]), post(2, 20, &["a", "b"])];
        let now = Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap();
        let stats = post_stats(&posts, now);
        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.total_tags, 2);
        assert_eq!(stats.recent_posts_count, 1);
        assert_eq!(stats.last_updated, Some(posts[1].updated));
        assert_eq!(post_stats(&[], now), PostStats::default());
    }
}
