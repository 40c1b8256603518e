// src/api/mod.rs
//! Notion API interaction: the ability to read the blog's content database.
//!
//! `NotionRepository` is the raw I/O seam (HTTP in production, fixtures in
//! tests). `NotionApi` wraps any repository with the rate-limit retry loop and
//! the error taxonomy every layer above it relies on.

pub mod client;
mod memo;
pub mod notion_client_adapter;
mod pagination;
pub mod parser;
mod responses;
mod retry;

use crate::error::{AppError, NotionApiError};
use crate::model::Block;
use crate::query::DatabaseQuery;
use crate::types::{BlockId, DatabaseId, PageId};
use serde_json::Value;
use std::sync::Arc;

pub use client::NotionHttpClient;
pub use memo::Memo;
pub use pagination::collect_all_pages;
pub use responses::PaginatedResponse;
pub use retry::{parse_retry_after, with_rate_limit_retry, RetryPolicy};

/// The ability to read content from a Notion workspace.
///
/// Business logic depends on this trait, never on HTTP details. Failures are
/// reported unclassified; `NotionApi` does the classifying.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    /// One page of database rows, as raw JSON.
    async fn query_database(
        &self,
        database: &DatabaseId,
        query: &DatabaseQuery,
    ) -> Result<PaginatedResponse<Value>, AppError>;

    /// A page object, as raw JSON.
    async fn retrieve_page(&self, id: &PageId) -> Result<Value, AppError>;

    async fn retrieve_block(&self, id: &BlockId) -> Result<Block, AppError>;

    /// One page of a block's direct children, partial blocks already dropped.
    async fn list_block_children(
        &self,
        parent: &BlockId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedResponse<Block>, AppError>;
}

/// Retrying, classifying front for a `NotionRepository`.
#[derive(Clone)]
pub struct NotionApi {
    repository: Arc<dyn NotionRepository>,
    retry: RetryPolicy,
}

impl NotionApi {
    pub fn new(repository: Arc<dyn NotionRepository>, retry: RetryPolicy) -> Self {
        Self { repository, retry }
    }

    pub async fn query_database(
        &self,
        database: &DatabaseId,
        query: &DatabaseQuery,
    ) -> Result<PaginatedResponse<Value>, NotionApiError> {
        with_rate_limit_retry(self.retry, "query_database", || {
            self.repository.query_database(database, query)
        })
        .await
    }

    pub async fn retrieve_page(&self, id: &PageId) -> Result<Value, NotionApiError> {
        with_rate_limit_retry(self.retry, "retrieve_page", || {
            self.repository.retrieve_page(id)
        })
        .await
    }

    pub async fn retrieve_block(&self, id: &BlockId) -> Result<Block, NotionApiError> {
        with_rate_limit_retry(self.retry, "retrieve_block", || {
            self.repository.retrieve_block(id)
        })
        .await
    }

    pub async fn list_block_children(
        &self,
        parent: &BlockId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedResponse<Block>, NotionApiError> {
        with_rate_limit_retry(self.retry, "list_block_children", || {
            self.repository.list_block_children(parent, cursor, page_size)
        })
        .await
    }
}
