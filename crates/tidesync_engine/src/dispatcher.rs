//! Process-wide sync task dispatch.

use crate::error::{EngineError, EngineResult};
use crate::handler::SyncHandler;
use crate::request::{OnComplete, SyncArgs, SyncTask};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tidesync_store::LocalStore;

/// Process-wide registry and runtime for sync tasks.
///
/// One dispatcher is constructed at startup and passed by reference; every
/// handler registers itself under a unique type key. Callers submit
/// [`SyncArgs`] describing one sync run and pick a mode on the returned
/// [`SyncTask`]: awaited, fire-and-forget, or deferred. Every fired task
/// runs as its own tokio task, so a failing or cancelled sync never cancels
/// unrelated siblings.
pub struct SyncDispatcher {
    store: Arc<dyn LocalStore>,
    handlers: RwLock<HashMap<String, Arc<dyn SyncHandler>>>,
}

impl SyncDispatcher {
    /// Creates a dispatcher gated on the given store.
    pub fn new(store: Arc<dyn LocalStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            handlers: RwLock::new(HashMap::new()),
        })
    }

    /// The store this dispatcher gates on.
    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    /// Registers a handler under its type key. Registering the same key
    /// twice is a startup programmer error and fails immediately.
    pub fn register_handler(
        &self,
        handler_type: impl Into<String>,
        handler: Arc<dyn SyncHandler>,
    ) -> EngineResult<()> {
        let key = handler_type.into();
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&key) {
            return Err(EngineError::HandlerAlreadyRegistered { handler: key });
        }
        handlers.insert(key, handler);
        Ok(())
    }

    /// Builds a submittable task for the given arguments.
    pub fn submit(self: &Arc<Self>, args: SyncArgs) -> SyncTask {
        SyncTask::new(Arc::clone(self), args)
    }

    pub(crate) async fn run_task(
        &self,
        args: SyncArgs,
        callbacks: Vec<OnComplete>,
    ) -> EngineResult<()> {
        let result = self.dispatch(&args).await;
        // callbacks run exactly once, in registration order, no matter how
        // the sync ended
        for callback in callbacks {
            callback().await;
        }
        result
    }

    async fn dispatch(&self, args: &SyncArgs) -> EngineResult<()> {
        // a locked store is an expected state, not a fault
        if !self.store.is_unlocked() {
            tracing::debug!(handler = args.handler(), "store locked, skipping sync");
            return Ok(());
        }

        let handler = self
            .handlers
            .read()
            .get(args.handler())
            .cloned()
            .ok_or_else(|| EngineError::HandlerNotRegistered {
                handler: args.handler().to_owned(),
            })?;
        handler.sync(args).await
    }
}
