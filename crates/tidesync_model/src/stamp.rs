//! Per-key staleness bookkeeping.

use chrono::{DateTime, Duration, Utc};

/// Separator joining the parts of a composite staleness key.
pub const KEY_SEPARATOR: &str = "|";

/// Per-key record of when a resource was last synced.
///
/// A stamp gates whether a resync is needed. It is read when a sync starts
/// and written back inside the same store transaction that persists the
/// fetched data, so a crash between fetch and persist never falsely marks a
/// key fresh.
///
/// Delta-capable resources track two times: `last_sync` for incremental
/// refreshes and `last_full_sync` for the periodic authoritative refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStamp {
    id: String,
    last_sync: Option<DateTime<Utc>>,
    last_full_sync: Option<DateTime<Utc>>,
}

impl SyncStamp {
    /// Creates a never-synced stamp for a composite key.
    pub fn new(parts: &[&str]) -> Self {
        Self {
            id: Self::key(parts),
            last_sync: None,
            last_full_sync: None,
        }
    }

    /// Joins key parts with the fixed separator.
    pub fn key(parts: &[&str]) -> String {
        parts.join(KEY_SEPARATOR)
    }

    /// The composite key this stamp describes.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When this key last completed any sync.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// When this key last completed a full refresh.
    pub fn last_full_sync(&self) -> Option<DateTime<Utc>> {
        self.last_full_sync
    }

    /// Returns true if a resync is needed: forced, never synced, or synced
    /// longer than `stale` ago.
    pub fn needs_sync(&self, stale: Duration, forced: bool) -> bool {
        self.needs_sync_at(Utc::now(), stale, forced)
    }

    /// Deterministic-clock variant of [`SyncStamp::needs_sync`].
    pub fn needs_sync_at(&self, now: DateTime<Utc>, stale: Duration, forced: bool) -> bool {
        forced || self.last_sync.is_none_or(|at| at < now - stale)
    }

    /// Returns true if a full refresh is needed for this key.
    pub fn needs_full_sync(&self, stale: Duration, forced: bool) -> bool {
        self.needs_full_sync_at(Utc::now(), stale, forced)
    }

    /// Deterministic-clock variant of [`SyncStamp::needs_full_sync`].
    pub fn needs_full_sync_at(&self, now: DateTime<Utc>, stale: Duration, forced: bool) -> bool {
        forced || self.last_full_sync.is_none_or(|at| at < now - stale)
    }

    /// Stamps this key as synced now. Callers persist the stamp inside the
    /// transaction that persists the accompanying data, and only when the
    /// fetch completed without page errors.
    pub fn track_sync(&mut self, full_sync: bool) {
        self.track_sync_at(Utc::now(), full_sync);
    }

    /// Deterministic-clock variant of [`SyncStamp::track_sync`].
    pub fn track_sync_at(&mut self, now: DateTime<Utc>, full_sync: bool) {
        self.last_sync = Some(now);
        if full_sync {
            self.last_full_sync = Some(now);
        }
    }

    /// Time range covering everything modified since the last sync, padded
    /// by `skew` on both ends to absorb clock drift between client and
    /// server. Never-synced keys get a range starting at the epoch.
    pub fn since_last_sync_window(&self, skew: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
        self.since_last_sync_window_at(Utc::now(), skew)
    }

    /// Deterministic-clock variant of [`SyncStamp::since_last_sync_window`].
    pub fn since_last_sync_window_at(
        &self,
        now: DateTime<Utc>,
        skew: Duration,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.last_sync.map_or(DateTime::UNIX_EPOCH, |at| at - skew);
        (start, now + skew)
    }
}
