//! Base contract for concrete sync handlers.

use crate::error::EngineResult;
use crate::reconcile::{ExistingIndex, Reconciler};
use crate::request::SyncArgs;
use async_trait::async_trait;
use std::sync::Arc;
use tidesync_model::{Entity, SyncStamp};
use tidesync_store::LocalStore;

/// One registered sync handler.
///
/// Concrete handlers are thin configurations of the engine: they pick a
/// keyed mutex and staleness key, fetch pages from the remote API, and hand
/// the aggregated payload to the [`Reconciler`]. Transport failures are
/// caught inside the handler, logged, and kept out of the staleness record
/// so the next trigger retries; sync failures never surface as UI-blocking
/// errors.
#[async_trait]
pub trait SyncHandler: Send + Sync {
    /// The store this handler reconciles into.
    fn store(&self) -> &Arc<dyn LocalStore>;

    /// Runs one sync described by `args`.
    async fn sync(&self, args: &SyncArgs) -> EngineResult<()>;

    /// Reads the staleness record for a composite key, defaulting to
    /// never-synced.
    fn last_sync(&self, parts: &[&str]) -> EngineResult<SyncStamp> {
        Ok(self.store().stamp(parts)?)
    }

    /// Reconciles fetched records and persists the staleness record in the
    /// same transaction. The stamp is only written when the fetch reported
    /// no page errors, so an incomplete fetch stays stale and retries on the
    /// next trigger. Returns the reconciler's clean flag.
    fn save_with_stamp(
        &self,
        stamp: &SyncStamp,
        reconciler: &Reconciler,
        incoming: Vec<Box<dyn Entity>>,
        existing: &mut ExistingIndex,
        fetch_had_errors: bool,
    ) -> EngineResult<bool> {
        let mut clean = true;
        let mut incoming = Some(incoming);
        self.store().transaction(&mut |txn| {
            let batch = incoming.take().unwrap_or_default();
            clean = reconciler.save_all(txn, batch, existing, fetch_had_errors)?;
            if !fetch_had_errors {
                txn.put_stamp(stamp)?;
            }
            Ok(())
        })?;
        Ok(clean)
    }
}
