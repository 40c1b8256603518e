// src/query/index.rs
//! The listing orchestrator over the blog database.

use super::extract;
use super::request::{ListingRequest, Query};
use crate::api::{collect_all_pages, Memo, NotionApi, PaginatedResponse};
use crate::error::NotionApiError;
use crate::model::PageMeta;
use crate::types::{DatabaseId, PageId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Listing {
    pub pages: Vec<PageMeta>,
    /// Feed back through `ListingRequest::after` to get the next page.
    pub next_cursor: Option<String>,
}

/// Answers listing and lookup questions about the blog database.
///
/// Listings are memoized by request value for a short window, so a burst of
/// identical calls costs one upstream query.
pub struct ContentIndex {
    api: NotionApi,
    database: DatabaseId,
    listings: Memo<ListingRequest, Listing>,
    pages: Memo<PageId, Option<PageMeta>>,
}

impl ContentIndex {
    pub fn new(
        api: NotionApi,
        database: DatabaseId,
        memo_capacity: usize,
        memo_window: Duration,
    ) -> Self {
        Self {
            api,
            database,
            listings: Memo::new(memo_capacity, memo_window),
            pages: Memo::new(memo_capacity, memo_window),
        }
    }

    /// One page of results for `request`.
    ///
    /// Unless the request was built with `include_private`, no row with
    /// `public == false` is ever returned, whatever the upstream filter did.
    pub async fn query(&self, request: &ListingRequest) -> Result<Listing, NotionApiError> {
        self.listings
            .get_or_try_insert_with(request.clone(), || self.fetch_listing(request))
            .await
    }

    async fn fetch_listing(&self, request: &ListingRequest) -> Result<Listing, NotionApiError> {
        let body = request.to_database_query();
        let response = self.api.query_database(&self.database, &body).await?;
        let next_cursor = response.continuation().map(str::to_string);

        let total = response.results.len();
        let pages: Vec<PageMeta> = response
            .results
            .iter()
            .filter(|row| extract::is_page_object(row))
            .filter_map(extract::page_meta)
            .filter(|page| page.public || !request.public_only())
            .collect();

        if pages.len() < total {
            log::debug!("Listing kept {} of {} rows", pages.len(), total);
        }

        Ok(Listing { pages, next_cursor })
    }

    /// Every page matching `request`, following cursors to the end.
    pub async fn all_pages(&self, request: &ListingRequest) -> Result<Vec<PageMeta>, NotionApiError> {
        collect_all_pages(|cursor| async move {
            let listing = self.query(&request.after(cursor)).await?;
            Ok(PaginatedResponse {
                has_more: listing.next_cursor.is_some(),
                next_cursor: listing.next_cursor,
                results: listing.pages,
            })
        })
        .await
    }

    /// The public post whose slug is `path`.
    pub async fn page_by_path(&self, path: &str) -> Result<Option<PageMeta>, NotionApiError> {
        let request = ListingRequest::new().with_query(Query::path(path));
        let listing = self.query(&request).await?;
        Ok(listing.pages.into_iter().find(|page| page.path == path))
    }

    /// A single page by id; `None` when it is missing, malformed or private.
    pub async fn get_page(&self, id: &PageId) -> Result<Option<PageMeta>, NotionApiError> {
        self.pages
            .get_or_try_insert_with(id.clone(), || async move {
                match self.api.retrieve_page(id).await {
                    Ok(raw) => Ok(extract::page_meta(&raw).filter(|page| page.public)),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
    }

    /// Forgets memoized listings and pages.
    pub fn clear_memo(&self) {
        self.listings.clear();
        self.pages.clear();
    }
}
