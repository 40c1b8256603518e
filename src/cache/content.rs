// src/cache/content.rs
//! Cached read functions over the content index and block materializer.

use super::domain::CacheDomain;
use super::service::CacheService;
use crate::blocks::BlockMaterializer;
use crate::enrich::{EnrichError, ImageProbe};
use crate::error::NotionApiError;
use crate::model::{self, Block, Dimensions, PageMeta, PostStats, TagCount};
use crate::query::{Combinator, ContentIndex, ListingRequest, Query, Sort};
use crate::types::{BlockId, PageId};
use chrono::Utc;
use std::sync::Arc;

/// Every read a page needs, each memoized in its cache domain under its name
/// and arguments.
#[derive(Clone)]
pub struct CachedContent {
    cache: Arc<CacheService>,
    index: Arc<ContentIndex>,
    blocks: Arc<BlockMaterializer>,
}

impl CachedContent {
    pub fn new(
        cache: Arc<CacheService>,
        index: Arc<ContentIndex>,
        blocks: Arc<BlockMaterializer>,
    ) -> Self {
        Self {
            cache,
            index,
            blocks,
        }
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    /// Every public post, newest first.
    pub async fn all_posts(&self) -> Result<Vec<PageMeta>, NotionApiError> {
        self.cache
            .get_or_compute(CacheDomain::Posts, "all_posts", None, || async {
                let request = ListingRequest::new().sorted_by(Sort::newest_first());
                self.index.all_pages(&request).await
            })
            .await
    }

    /// The newest `count` public posts.
    pub async fn recent_posts(&self, count: usize) -> Result<Vec<PageMeta>, NotionApiError> {
        let key = format!("recent_posts:{}", count);
        self.cache
            .get_or_compute(CacheDomain::Posts, &key, None, || async {
                let mut posts = self.all_posts().await?;
                posts.truncate(count);
                Ok(posts)
            })
            .await
    }

    /// Public posts carrying `tag`, newest first.
    pub async fn posts_by_tag(&self, tag: &str) -> Result<Vec<PageMeta>, NotionApiError> {
        let key = format!("posts_by_tag:{}", tag);
        let path = format!("/tag/{}", tag);
        self.cache
            .get_or_compute(CacheDomain::TagPosts, &key, Some(&path), || async {
                let request = ListingRequest::new()
                    .with_query(Query::tags(Combinator::And, [tag]))
                    .sorted_by(Sort::newest_first());
                self.index.all_pages(&request).await
            })
            .await
    }

    /// The public post whose slug is `path`.
    pub async fn post_by_path(&self, path: &str) -> Result<Option<PageMeta>, NotionApiError> {
        let key = format!("post_by_path:{}", path);
        let page_path = format!("/post/{}", path);
        self.cache
            .get_or_compute(CacheDomain::Post, &key, Some(&page_path), || {
                self.index.page_by_path(path)
            })
            .await
    }

    /// The enriched block tree of a page.
    pub async fn blocks(&self, page: &PageId) -> Result<Vec<Block>, NotionApiError> {
        let key = format!("blocks:{}", page);
        self.cache
            .get_or_compute(CacheDomain::Blocks, &key, None, || async {
                self.blocks.get_blocks(&BlockId::from(page)).await
            })
            .await
    }

    /// Every tag in use, sorted.
    pub async fn all_tags(&self) -> Result<Vec<String>, NotionApiError> {
        self.cache
            .get_or_compute(CacheDomain::Metadata, "all_tags", None, || async {
                Ok(model::unique_tags(&self.all_posts().await?))
            })
            .await
    }

    /// The `count` most used tags, ties broken by name.
    pub async fn popular_tags(&self, count: usize) -> Result<Vec<TagCount>, NotionApiError> {
        let key = format!("popular_tags:{}", count);
        self.cache
            .get_or_compute(CacheDomain::Metadata, &key, None, || async {
                Ok(model::popular_tags(&self.all_posts().await?, count))
            })
            .await
    }

    /// Posts whose title, description or tags contain `term`.
    pub async fn search(&self, term: &str) -> Result<Vec<PageMeta>, NotionApiError> {
        let key = format!("search:{}", term.trim().to_lowercase());
        self.cache
            .get_or_compute(CacheDomain::Search, &key, None, || async {
                Ok(model::search_posts(&self.all_posts().await?, term))
            })
            .await
    }

    pub async fn post_stats(&self) -> Result<PostStats, NotionApiError> {
        self.cache
            .get_or_compute(CacheDomain::Metadata, "post_stats", None, || async {
                Ok(model::post_stats(&self.all_posts().await?, Utc::now()))
            })
            .await
    }
}

/// An `ImageProbe` whose answers live in the images domain.
pub struct CachedImageProbe {
    cache: Arc<CacheService>,
    inner: Arc<dyn ImageProbe>,
}

impl CachedImageProbe {
    pub fn new(cache: Arc<CacheService>, inner: Arc<dyn ImageProbe>) -> Self {
        Self { cache, inner }
    }
}

#[async_trait::async_trait]
impl ImageProbe for CachedImageProbe {
    async fn dimensions(&self, url: &str) -> Result<Dimensions, EnrichError> {
        let key = format!("image_dimensions:{}", url);
        self.cache
            .get_or_compute(CacheDomain::Images, &key, None, || {
                self.inner.dimensions(url)
            })
            .await
    }
}
