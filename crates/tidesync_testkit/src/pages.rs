//! Scripted page responses for fetch tests.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tidesync_api::{ApiResponse, Envelope};

/// Serves pre-scripted page responses and counts fetch calls.
///
/// Unscripted pages answer with an empty success, so a test only scripts
/// the pages it cares about.
pub struct PagedApi<T> {
    pages: Mutex<HashMap<u32, ApiResponse<T>>>,
    calls: AtomicU32,
}

impl<T: Clone> PagedApi<T> {
    /// Creates an API stub with no pages scripted.
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Scripts the response for one page.
    pub fn page(self, page: u32, response: ApiResponse<T>) -> Self {
        self.pages.lock().insert(page, response);
        self
    }

    /// Replaces the response for one page on an existing stub.
    pub fn set_page(&self, page: u32, response: ApiResponse<T>) {
        self.pages.lock().insert(page, response);
    }

    /// Fetches one page, recording the call.
    pub fn fetch(&self, page: u32) -> ApiResponse<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .get(&page)
            .cloned()
            .unwrap_or_else(|| ApiResponse::success(200, Envelope::of(Vec::new())))
    }

    /// Number of fetch calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T: Clone> Default for PagedApi<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_and_unscripted_pages() {
        let api = PagedApi::new().page(1, ApiResponse::success(200, Envelope::of(vec![1u32])));

        assert_eq!(api.fetch(1).body().unwrap().data, vec![1]);
        assert!(api.fetch(2).body().unwrap().data.is_empty());
        assert_eq!(api.calls(), 2);

        api.set_page(2, ApiResponse::error(500, "{}"));
        assert!(api.fetch(2).has_errors());
        assert_eq!(api.calls(), 3);
    }
}
