use crate::types::PageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the content index: a post as the listing layer sees it.
///
/// Built fresh from every upstream row and never mutated afterwards. Only
/// rows with `public == true` ever leave the query layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub id: PageId,
    /// URL slug; assumed unique among public pages.
    pub path: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub tags: Vec<String>,
    pub public: bool,
    /// Author-supplied publication time.
    pub published: DateTime<Utc>,
    /// Upstream last-edit time.
    pub updated: DateTime<Utc>,
}

impl PageMeta {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Site-relative URL of the post.
    pub fn href(&self) -> String {
        format!("/post/{}", self.path)
    }
}
