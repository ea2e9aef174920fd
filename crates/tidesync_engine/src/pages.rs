//! Concurrent pagination fetch.

use futures::future::join_all;
use std::future::Future;
use tidesync_api::ApiResponse;

/// Fetches every page of a paginated collection endpoint.
///
/// Page 1 is always fetched and inspected first; its
/// `meta.pagination.total_pages` decides how many more pages exist. `limit`
/// caps the total pages fetched, with `0` meaning unbounded. The remaining
/// pages are fetched concurrently with no ordering guarantee among
/// themselves, and the full page set is returned, failed pages included, so
/// one bad page never fails the whole operation.
pub async fn fetch_pages<T, F, Fut>(limit: u32, fetch_page: F) -> Vec<ApiResponse<T>>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = ApiResponse<T>>,
{
    let first = fetch_page(1).await;

    let total_pages = first
        .body()
        .filter(|_| first.is_success())
        .and_then(|body| body.total_pages())
        .unwrap_or(1);
    let pages_to_fetch = if limit == 0 {
        total_pages
    } else {
        limit.min(total_pages)
    };

    let mut responses = vec![first];
    let remaining = (2..=pages_to_fetch).map(|page| fetch_page(page));
    responses.extend(join_all(remaining).await);
    responses
}
