mod block;
pub mod blocks;
pub mod common;
mod page;
pub mod posts;

pub use block::Block;
pub use blocks::*;
pub use common::*;
pub use page::PageMeta;
pub use posts::{
    popular_tags, post_stats, related_posts, related_tags, search_posts, unique_tags, PostStats,
    TagCount,
};
