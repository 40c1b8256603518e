// src/api/pagination.rs
//! Cursor pagination drained into a single list.

use super::responses::PaginatedResponse;
use std::future::Future;

/// Fetches every page of a cursor-paginated listing, in order.
///
/// `fetch_fn` receives the cursor of the page to load (`None` for the first
/// one). Stops at the first page that reports no continuation; the first
/// error aborts the whole walk.
pub async fn collect_all_pages<T, E, F, Fut>(mut fetch_fn: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<PaginatedResponse<T>, E>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        let response = fetch_fn(cursor).await?;
        pages_fetched += 1;

        cursor = response.continuation().map(str::to_string);
        all_items.extend(response.results);

        if cursor.is_none() {
            break;
        }
    }

    log::trace!(
        "Collected {} items over {} page(s)",
        all_items.len(),
        pages_fetched
    );
    Ok(all_items)
}
