// src/blocks/mod.rs
//! Block tree materialization.
//!
//! A page's content arrives one level at a time from the children endpoint.
//! The materializer walks it depth first, enriching every block on the way
//! and attaching children so callers get the whole tree at once.

mod context;

use crate::api::{collect_all_pages, Memo, NotionApi};
use crate::constants::{
    BLOCK_FETCH_CONCURRENCY, MEMO_CAPACITY, MEMO_WINDOW, NOTION_API_PAGE_SIZE,
    NOTION_MAX_BLOCK_DEPTH,
};
use crate::enrich::BlockEnricher;
use crate::error::NotionApiError;
use crate::model::Block;
use crate::types::BlockId;
use context::{Descent, TreeContext};
use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Tuning for a `BlockMaterializer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Upstream fetches (children pages, probes, unfurls) in flight at once.
    pub concurrency: usize,
    pub page_size: u32,
    pub max_depth: usize,
    pub memo_capacity: usize,
    pub memo_window: Duration,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            concurrency: BLOCK_FETCH_CONCURRENCY,
            page_size: NOTION_API_PAGE_SIZE,
            max_depth: NOTION_MAX_BLOCK_DEPTH,
            memo_capacity: MEMO_CAPACITY,
            memo_window: MEMO_WINDOW,
        }
    }
}

/// Builds enriched block trees.
///
/// Sibling subtrees are processed concurrently, but the result keeps
/// upstream order. A shared permit pool bounds in-flight upstream requests
/// across the whole walk; permits are held only for the duration of a single
/// request, never across recursion.
pub struct BlockMaterializer {
    api: NotionApi,
    enricher: BlockEnricher,
    permits: Arc<Semaphore>,
    options: MaterializeOptions,
    trees: Memo<(BlockId, u32), Vec<Block>>,
}

impl BlockMaterializer {
    pub fn new(api: NotionApi, enricher: BlockEnricher, options: MaterializeOptions) -> Self {
        let concurrency = options.concurrency.max(1);
        Self {
            api,
            enricher,
            permits: Arc::new(Semaphore::new(concurrency)),
            options: MaterializeOptions {
                concurrency,
                ..options
            },
            trees: Memo::new(options.memo_capacity, options.memo_window),
        }
    }

    /// The full enriched tree under `parent`, in upstream order.
    pub async fn get_blocks(&self, parent: &BlockId) -> Result<Vec<Block>, NotionApiError> {
        self.get_blocks_paged(parent, self.options.page_size).await
    }

    /// Same as `get_blocks`, listing children `page_size` at a time.
    pub async fn get_blocks_paged(
        &self,
        parent: &BlockId,
        page_size: u32,
    ) -> Result<Vec<Block>, NotionApiError> {
        self.trees
            .get_or_try_insert_with((parent.clone(), page_size), || async move {
                let context = TreeContext::root(parent, self.options.max_depth);
                let tree = self.materialize(parent.clone(), page_size, context).await?;
                log::debug!(
                    "Materialized {} blocks under {}",
                    tree.iter().map(Block::tree_size).sum::<usize>(),
                    parent
                );
                Ok(tree)
            })
            .await
    }

    /// One block, enriched, without its children. `None` when it does not exist.
    pub async fn get_block(&self, id: &BlockId) -> Result<Option<Block>, NotionApiError> {
        let mut block = match self.api.retrieve_block(id).await {
            Ok(block) => block,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let _permit = self.acquire().await?;
        self.enricher.enrich(&mut block).await;
        Ok(Some(block))
    }

    /// Forgets memoized trees.
    pub fn clear_memo(&self) {
        self.trees.clear();
    }

    async fn acquire(&self) -> Result<SemaphorePermit<'_>, NotionApiError> {
        self.permits
            .acquire()
            .await
            .map_err(|e| NotionApiError::NotHandled(format!("fetch permits closed: {}", e)))
    }

    fn materialize(
        &self,
        parent: BlockId,
        page_size: u32,
        context: TreeContext,
    ) -> BoxFuture<'_, Result<Vec<Block>, NotionApiError>> {
        async move {
            let blocks = self.list_children(&parent, page_size).await?;

            stream::iter(
                blocks
                    .into_iter()
                    .map(|block| self.complete(block, page_size, context.clone())),
            )
            .buffered(self.options.concurrency)
            .try_collect()
            .await
        }
        .boxed()
    }

    async fn list_children(
        &self,
        parent: &BlockId,
        page_size: u32,
    ) -> Result<Vec<Block>, NotionApiError> {
        collect_all_pages(|cursor| async move {
            let _permit = self.acquire().await?;
            self.api
                .list_block_children(parent, cursor.as_deref(), page_size)
                .await
        })
        .await
    }

    /// Enriches `block` and attaches its subtree.
    async fn complete(
        &self,
        mut block: Block,
        page_size: u32,
        context: TreeContext,
    ) -> Result<Block, NotionApiError> {
        if BlockEnricher::needs_fetch(&block) {
            let _permit = self.acquire().await?;
            self.enricher.enrich(&mut block).await;
        } else {
            self.enricher.enrich(&mut block).await;
        }

        if !block.has_children() {
            return Ok(block);
        }

        let source = block.children_source().clone();
        match context.descend(&source) {
            Descent::Into(inner) => {
                let children = self.materialize(source, page_size, inner).await?;
                block.set_children(children);
            }
            Descent::TooDeep => {
                log::warn!(
                    "Block {} is nested deeper than {} levels; leaving its children out",
                    block.id(),
                    self.options.max_depth
                );
            }
            Descent::Cycle => {
                log::warn!(
                    "Block {} points back at its own ancestor {}; not descending",
                    block.id(),
                    source
                );
            }
        }

        Ok(block)
    }
}
