// src/lib.rs
//! notion2blog library: the content layer of a Notion-backed blog.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `NotionApiError`, `ValidationError`
//! - **Configuration**: `CommandLineInput`, `SiteConfig`
//! - **Domain model**: `PageMeta`, `Block` and its payloads, post statistics
//! - **API client**: `NotionRepository`, `NotionHttpClient`, `NotionApi`
//! - **Queries**: `Query`, `Filter`, `ListingRequest`, `ContentIndex`
//! - **Blocks**: `BlockMaterializer`, `BlockEnricher`
//! - **Caching**: `CacheService`, `CachedContent`, `Revalidator`
//! - **Pages**: `PageData` aggregators
//! - **Server**: axum `router` and `AppState`

pub mod aggregate;
pub mod api;
pub mod blocks;
pub mod cache;
pub mod config;
pub mod constants;
pub mod enrich;
pub mod error;
pub mod model;
pub mod query;
pub mod server;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, NotionApiError, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{Command, CommandLineInput, SiteConfig};

// --- Domain Model ---
pub use crate::model::{Block, BlockCommon, Dimensions, PageMeta, PostStats, TagCount, WebMetadata};

// --- Domain Types ---
pub use crate::types::{
    Annotations, ApiKey, BearerToken, BlockId, Color, DatabaseId, EquationData, Link, PageId,
    RichTextItem, RichTextType, TextContent,
};

// --- API Client ---
pub use crate::api::{
    collect_all_pages, NotionApi, NotionHttpClient, NotionRepository, PaginatedResponse,
    RetryPolicy,
};

// --- Queries ---
pub use crate::query::{
    build_filter, page_meta, Combinator, ContentIndex, Filter, Listing, ListingRequest, Query,
    RawQuery, Sort,
};

// --- Blocks ---
pub use crate::blocks::{BlockMaterializer, MaterializeOptions};
pub use crate::enrich::{BlockEnricher, EquationRenderer, ImageProbe, LinkUnfurler};

// --- Caching ---
pub use crate::cache::{
    CacheDomain, CacheService, CacheTag, CacheTtls, CachedContent, RevalidateAction,
    RevalidationReport, Revalidator,
};

// --- Pages ---
pub use crate::aggregate::PageData;

// --- Server ---
pub use crate::server::{router, AppState};
