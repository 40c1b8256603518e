// src/aggregate/mod.rs
//! Per-page view models.
//!
//! Each aggregator fans out its cached reads concurrently and assembles what
//! one page type needs. Listing pages never fail: on any upstream error they
//! log and hand back an empty view. Single-item pages answer `None` instead,
//! which the caller renders as not found.

use crate::cache::CachedContent;
use crate::constants::{POPULAR_TAGS, POSTS_PER_PAGE, PREVIEW_POSTS, RELATED_TAGS};
use crate::error::NotionApiError;
use crate::model::{self, Block, PageMeta, PostStats, TagCount};
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HomepageData {
    pub posts: Vec<PageMeta>,
    pub popular_tags: Vec<TagCount>,
    pub stats: PostStats,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllPostsPageData {
    pub posts: Vec<PageMeta>,
    pub tags: Vec<String>,
    pub stats: PostStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPageData {
    pub meta: PageMeta,
    pub blocks: Vec<Block>,
    pub related_posts: Vec<PageMeta>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagPageData {
    pub tag: String,
    pub posts: Vec<PageMeta>,
    pub related_tags: Vec<TagCount>,
    pub stats: PostStats,
    pub total_posts: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchPageData {
    pub all_posts: Vec<PageMeta>,
    pub popular_tags: Vec<TagCount>,
    pub recent_posts: Vec<PageMeta>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SitemapData {
    pub posts: Vec<PageMeta>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// What a cache warm-up fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreloadSummary {
    pub all_posts: usize,
    pub recent_posts: usize,
    pub popular_tags: usize,
    pub all_tags: usize,
    pub stats: PostStats,
    pub timestamp: DateTime<Utc>,
}

/// Builds view models for each page type from the cached content layer.
#[derive(Clone)]
pub struct PageData {
    content: CachedContent,
    posts_per_page: usize,
    preview_posts: usize,
    batch_concurrency: usize,
}

impl PageData {
    pub fn new(content: CachedContent) -> Self {
        Self {
            content,
            posts_per_page: POSTS_PER_PAGE,
            preview_posts: PREVIEW_POSTS,
            batch_concurrency: num_cpus::get().max(1),
        }
    }

    /// Overrides how many posts the homepage lists and how many related
    /// posts a single post shows.
    pub fn with_page_sizes(mut self, posts_per_page: usize, preview_posts: usize) -> Self {
        self.posts_per_page = posts_per_page;
        self.preview_posts = preview_posts;
        self
    }

    pub fn content(&self) -> &CachedContent {
        &self.content
    }

    /// The homepage with the configured number of posts.
    pub async fn homepage(&self) -> HomepageData {
        self.homepage_data(self.posts_per_page).await
    }

    /// Recent posts, the top five tags and site stats.
    pub async fn homepage_data(&self, posts_count: usize) -> HomepageData {
        let fetched = futures::try_join!(
            self.content.recent_posts(posts_count),
            self.content.popular_tags(5),
            self.content.post_stats(),
        );

        match fetched {
            Ok((posts, popular_tags, stats)) => HomepageData {
                posts,
                popular_tags,
                stats,
            },
            Err(e) => fallback("homepage", e),
        }
    }

    pub async fn all_posts_page_data(&self) -> AllPostsPageData {
        let fetched = futures::try_join!(
            self.content.all_posts(),
            self.content.all_tags(),
            self.content.post_stats(),
        );

        match fetched {
            Ok((posts, tags, stats)) => AllPostsPageData { posts, tags, stats },
            Err(e) => fallback("all posts", e),
        }
    }

    /// The post at `path` with its blocks and related posts. `None` when the
    /// post does not exist or could not be fetched.
    pub async fn post_page_data(&self, path: &str) -> Option<PostPageData> {
        let meta = match self.content.post_by_path(path).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return None,
            Err(e) => {
                log::error!("Error fetching post page data for {}: {}", path, e);
                return None;
            }
        };

        let (blocks, related_posts) = futures::join!(
            self.content.blocks(&meta.id),
            self.related_posts(&meta, self.preview_posts),
        );

        match blocks {
            Ok(blocks) => Some(PostPageData {
                meta,
                blocks,
                related_posts,
            }),
            Err(e) => {
                log::error!("Error fetching blocks for post {}: {}", path, e);
                None
            }
        }
    }

    /// Posts sharing a tag with `current`, newest first. Falls back to recent
    /// posts when `current` has no tags or the tag lookups fail.
    pub async fn related_posts(&self, current: &PageMeta, limit: usize) -> Vec<PageMeta> {
        if current.tags.is_empty() {
            return self.recent_excluding(current, limit).await;
        }

        let by_tag = futures::future::try_join_all(
            current
                .tags
                .iter()
                .map(|tag| self.content.posts_by_tag(tag)),
        )
        .await;

        match by_tag {
            Ok(lists) => model::related_posts(current, lists.into_iter().flatten().collect(), limit),
            Err(e) => {
                log::error!("Error fetching related posts for {}: {}", current.path, e);
                self.recent_excluding(current, limit).await
            }
        }
    }

    async fn recent_excluding(&self, current: &PageMeta, limit: usize) -> Vec<PageMeta> {
        match self.content.recent_posts(limit + 1).await {
            Ok(posts) => posts
                .into_iter()
                .filter(|post| post.id != current.id)
                .take(limit)
                .collect(),
            Err(e) => {
                log::error!("Error fetching recent posts: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn tag_page_data(&self, tag: &str) -> TagPageData {
        let fetched = futures::try_join!(self.content.posts_by_tag(tag), self.content.post_stats());

        match fetched {
            Ok((posts, stats)) => TagPageData {
                tag: tag.to_string(),
                related_tags: model::related_tags(&posts, tag, RELATED_TAGS),
                total_posts: posts.len(),
                posts,
                stats,
            },
            Err(e) => TagPageData {
                tag: tag.to_string(),
                ..fallback("tag", e)
            },
        }
    }

    pub async fn search_page_data(&self) -> SearchPageData {
        let fetched = futures::try_join!(
            self.content.all_posts(),
            self.content.popular_tags(POPULAR_TAGS),
            self.content.recent_posts(10),
        );

        match fetched {
            Ok((all_posts, popular_tags, recent_posts)) => SearchPageData {
                all_posts,
                popular_tags,
                recent_posts,
            },
            Err(e) => fallback("search", e),
        }
    }

    /// Metadata for each of `paths` that exists, in input order.
    pub async fn batch_posts_data(&self, paths: &[String]) -> Vec<PageMeta> {
        stream::iter(paths.iter().map(|path| async move {
            match self.content.post_by_path(path).await {
                Ok(found) => found,
                Err(e) => {
                    log::error!("Error fetching post {}: {}", path, e);
                    None
                }
            }
        }))
        .buffered(self.batch_concurrency)
        .filter_map(|found| async move { found })
        .collect()
        .await
    }

    pub async fn sitemap_data(&self) -> SitemapData {
        let fetched = futures::try_join!(self.content.all_posts(), self.content.post_stats());

        match fetched {
            Ok((posts, stats)) => SitemapData {
                posts,
                last_modified: stats.last_updated,
            },
            Err(e) => fallback("sitemap", e),
        }
    }

    /// Warms the reads every page leans on.
    pub async fn preload_critical_data(&self) -> Result<PreloadSummary, NotionApiError> {
        let (all_posts, recent_posts, popular_tags, all_tags, stats) = futures::try_join!(
            self.content.all_posts(),
            self.content.recent_posts(10),
            self.content.popular_tags(POPULAR_TAGS),
            self.content.all_tags(),
            self.content.post_stats(),
        )?;

        Ok(PreloadSummary {
            all_posts: all_posts.len(),
            recent_posts: recent_posts.len(),
            popular_tags: popular_tags.len(),
            all_tags: all_tags.len(),
            stats,
            timestamp: Utc::now(),
        })
    }
}

fn fallback<T: Default>(page: &str, error: NotionApiError) -> T {
    log::error!("Error fetching {} page data: {}", page, error);
    T::default()
}
