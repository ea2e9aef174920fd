//! Per-resource sync configuration.

use crate::reconcile::{Reconciler, DEFAULT_MERGE_DEPTH};
use chrono::Duration;

/// Tuning for one synced resource.
///
/// Concrete handlers keep one of these per resource kind and feed the pieces
/// to the staleness check, the pagination fetch, and the reconciler. Orphan
/// cleanup stays off unless the resource's collection fetch is authoritative
/// for its whole scope.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How long fetched data stays fresh.
    pub stale_duration: Duration,
    /// How long before a delta-synced resource needs a full refresh.
    pub full_stale_duration: Duration,
    /// Page cap for collection fetches; 0 means unbounded.
    pub page_limit: u32,
    /// Whether orphans may be deleted after an error-free fetch.
    pub orphan_cleanup: bool,
    /// Depth bound for recursive relationship merges.
    pub merge_depth: usize,
}

impl SyncConfig {
    /// Creates a configuration with the given staleness window.
    pub fn new(stale_duration: Duration) -> Self {
        Self {
            stale_duration,
            full_stale_duration: stale_duration,
            page_limit: 0,
            orphan_cleanup: false,
            merge_depth: DEFAULT_MERGE_DEPTH,
        }
    }

    /// Sets the full-refresh staleness window.
    pub fn with_full_stale_duration(mut self, duration: Duration) -> Self {
        self.full_stale_duration = duration;
        self
    }

    /// Sets the page cap (0 = unbounded).
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// Opts into orphan cleanup for authoritative fetches.
    pub fn with_orphan_cleanup(mut self, enabled: bool) -> Self {
        self.orphan_cleanup = enabled;
        self
    }

    /// Sets the merge depth bound.
    pub fn with_merge_depth(mut self, depth: usize) -> Self {
        self.merge_depth = depth;
        self
    }

    /// Builds a reconciler matching this configuration.
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new()
            .with_max_depth(self.merge_depth)
            .with_orphan_cleanup(self.orphan_cleanup)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(Duration::hours(6))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = SyncConfig::new(Duration::hours(1))
            .with_full_stale_duration(Duration::weeks(4))
            .with_page_limit(2)
            .with_orphan_cleanup(true)
            .with_merge_depth(2);

        assert_eq!(config.stale_duration, Duration::hours(1));
        assert_eq!(config.full_stale_duration, Duration::weeks(4));
        assert_eq!(config.page_limit, 2);
        assert!(config.orphan_cleanup);
        assert_eq!(config.merge_depth, 2);
    }

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.stale_duration, config.full_stale_duration);
        assert_eq!(config.page_limit, 0);
        assert!(!config.orphan_cleanup);
        assert_eq!(config.merge_depth, DEFAULT_MERGE_DEPTH);
    }
}
