// src/cache/domain.rs
//! The fixed vocabulary of cache domains and invalidation tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Invalidation group attached to cached results. Unrelated to post tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTag {
    Posts,
    Content,
    Tags,
    Search,
    Blocks,
    Metadata,
    Static,
    Images,
}

impl CacheTag {
    pub const ALL: [CacheTag; 8] = [
        CacheTag::Posts,
        CacheTag::Content,
        CacheTag::Tags,
        CacheTag::Search,
        CacheTag::Blocks,
        CacheTag::Metadata,
        CacheTag::Static,
        CacheTag::Images,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTag::Posts => "posts",
            CacheTag::Content => "content",
            CacheTag::Tags => "tags",
            CacheTag::Search => "search",
            CacheTag::Blocks => "blocks",
            CacheTag::Metadata => "metadata",
            CacheTag::Static => "static",
            CacheTag::Images => "images",
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A family of cached functions sharing tags and a time to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheDomain {
    Posts,
    Post,
    TagPosts,
    Search,
    Metadata,
    Blocks,
    Images,
}

impl CacheDomain {
    pub const ALL: [CacheDomain; 7] = [
        CacheDomain::Posts,
        CacheDomain::Post,
        CacheDomain::TagPosts,
        CacheDomain::Search,
        CacheDomain::Metadata,
        CacheDomain::Blocks,
        CacheDomain::Images,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CacheDomain::Posts => "posts",
            CacheDomain::Post => "post",
            CacheDomain::TagPosts => "tag_posts",
            CacheDomain::Search => "search",
            CacheDomain::Metadata => "metadata",
            CacheDomain::Blocks => "blocks",
            CacheDomain::Images => "images",
        }
    }

    pub fn tags(&self) -> &'static [CacheTag] {
        use CacheTag::*;

        match self {
            CacheDomain::Posts | CacheDomain::Post => &[Posts, Content],
            CacheDomain::TagPosts => &[Posts, Tags, Content],
            CacheDomain::Search => &[Search, Content],
            CacheDomain::Metadata => &[Metadata, Static],
            CacheDomain::Blocks => &[Blocks, Content],
            CacheDomain::Images => &[Images, Static],
        }
    }
}

/// Time to live per domain, from "changes often" to "changes rarely".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTtls {
    pub posts: Duration,
    pub post: Duration,
    pub tag_posts: Duration,
    pub search: Duration,
    pub metadata: Duration,
    pub blocks: Duration,
    pub images: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            posts: Duration::from_secs(900),
            post: Duration::from_secs(900),
            tag_posts: Duration::from_secs(1800),
            search: Duration::from_secs(300),
            metadata: Duration::from_secs(3600),
            blocks: Duration::from_secs(1800),
            images: Duration::from_secs(86_400),
        }
    }
}

impl CacheTtls {
    pub fn ttl(&self, domain: CacheDomain) -> Duration {
        match domain {
            CacheDomain::Posts => self.posts,
            CacheDomain::Post => self.post,
            CacheDomain::TagPosts => self.tag_posts,
            CacheDomain::Search => self.search,
            CacheDomain::Metadata => self.metadata,
            CacheDomain::Blocks => self.blocks,
            CacheDomain::Images => self.images,
        }
    }
}
