// src/cache/revalidate.rs
//! Operator-facing invalidation.

use super::domain::CacheTag;
use super::service::CacheService;
use crate::blocks::BlockMaterializer;
use crate::query::ContentIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What an invalidation touched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevalidationReport {
    pub tags: Vec<CacheTag>,
    pub paths: Vec<String>,
    /// Cache entries actually dropped.
    pub entries_removed: usize,
}

/// A revalidation request as the trigger endpoint receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RevalidateAction {
    Posts,
    Post { path: String },
    Tag { tag: String },
    Search,
    Static,
    All,
}

impl RevalidateAction {
    pub const NAMES: [&'static str; 6] = ["posts", "post", "tag", "search", "static", "all"];

    pub fn name(&self) -> &'static str {
        match self {
            RevalidateAction::Posts => "posts",
            RevalidateAction::Post { .. } => "post",
            RevalidateAction::Tag { .. } => "tag",
            RevalidateAction::Search => "search",
            RevalidateAction::Static => "static",
            RevalidateAction::All => "all",
        }
    }

    /// Tags and paths this action expires.
    pub fn targets(&self) -> (Vec<CacheTag>, Vec<String>) {
        use CacheTag::*;

        match self {
            RevalidateAction::Posts => (vec![Posts, Content], paths(&["/", "/post"])),
            RevalidateAction::Post { path } => {
                (vec![Posts, Content], vec![format!("/post/{}", path), "/".to_string()])
            }
            RevalidateAction::Tag { tag } => (vec![Tags, Posts], vec![format!("/tag/{}", tag)]),
            RevalidateAction::Search => (vec![Search], Vec::new()),
            RevalidateAction::Static => {
                (vec![Static, Metadata], paths(&["/robots.txt", "/sitemap.xml"]))
            }
            RevalidateAction::All => (
                CacheTag::ALL.to_vec(),
                paths(&["/", "/post", "/robots.txt", "/sitemap.xml"]),
            ),
        }
    }
}

fn paths(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|p| p.to_string()).collect()
}

/// Expires cache entries by tag and path, and forgets the in-process memos
/// behind them so the next read goes all the way upstream.
#[derive(Clone)]
pub struct Revalidator {
    cache: Arc<CacheService>,
    index: Arc<ContentIndex>,
    blocks: Arc<BlockMaterializer>,
}

impl Revalidator {
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

    pub fn invalidate_all_content(&self) -> RevalidationReport {
        self.invalidate(vec![CacheTag::Content], Vec::new())
    }

    pub fn invalidate_posts(&self) -> RevalidationReport {
        self.invalidate(vec![CacheTag::Posts], Vec::new())
    }

    pub fn invalidate_search(&self) -> RevalidationReport {
        self.invalidate(vec![CacheTag::Search], Vec::new())
    }

    /// One post changed: its listings and its own page.
    pub fn invalidate_post(&self, path: &str) -> RevalidationReport {
        self.invalidate(
            vec![CacheTag::Posts, CacheTag::Content],
            vec![format!("/post/{}", path)],
        )
    }

    pub fn invalidate_tag_queries(&self, tag: &str) -> RevalidationReport {
        self.invalidate(vec![CacheTag::Tags], vec![format!("/tag/{}", tag)])
    }

    pub fn invalidate_static(&self) -> RevalidationReport {
        self.invalidate(vec![CacheTag::Static, CacheTag::Metadata], Vec::new())
    }

    /// Every tag of every domain, plus the root path.
    pub fn purge_all(&self) -> RevalidationReport {
        self.invalidate(CacheTag::ALL.to_vec(), vec!["/".to_string()])
    }

    pub fn apply(&self, action: &RevalidateAction) -> RevalidationReport {
        let (tags, paths) = action.targets();
        self.invalidate(tags, paths)
    }

    fn invalidate(&self, tags: Vec<CacheTag>, paths: Vec<String>) -> RevalidationReport {
        let mut removed = 0;
        for tag in &tags {
            removed += self.cache.invalidate_tag(*tag);
        }
        for path in &paths {
            removed += self.cache.invalidate_path(path);
        }
        self.index.clear_memo();
        self.blocks.clear_memo();

        log::info!(
            "Revalidated tags [{}] paths [{}]: {} entries dropped",
            tags.iter().map(CacheTag::as_str).collect::<Vec<_>>().join(", "),
            paths.join(", "),
            removed
        );

        RevalidationReport {
            tags,
            paths,
            entries_removed: removed,
        }
    }
}
