//! Sync request descriptors.

use crate::dispatcher::SyncDispatcher;
use crate::error::EngineResult;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What a sync request targets. Each variant carries only the fields its
/// resource kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncScope {
    /// A singleton resource with no scoping (e.g. the current user).
    Global,
    /// Every record in one account's collection.
    Account {
        /// Owning account id.
        account_id: String,
    },
    /// One resource by id.
    Resource {
        /// Resource id.
        id: String,
    },
    /// Records touched inside a time window for one account.
    Window {
        /// Owning account id.
        account_id: String,
        /// Window start, inclusive.
        since: DateTime<Utc>,
        /// Window end, inclusive.
        until: DateTime<Utc>,
    },
    /// Locally created or edited records waiting to be pushed.
    Dirty,
    /// Server-side deletion tombstones.
    Deleted,
}

impl SyncScope {
    /// Account id, for the variants scoped to one.
    pub fn account_id(&self) -> Option<&str> {
        match self {
            SyncScope::Account { account_id } | SyncScope::Window { account_id, .. } => {
                Some(account_id)
            }
            _ => None,
        }
    }

    /// Resource id, for single-resource requests.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            SyncScope::Resource { id } => Some(id),
            _ => None,
        }
    }
}

/// Arguments one sync run receives.
#[derive(Debug, Clone)]
pub struct SyncArgs {
    handler: String,
    scope: SyncScope,
    forced: bool,
    page: Option<u32>,
}

impl SyncArgs {
    /// Creates arguments for a handler type and scope.
    pub fn new(handler: impl Into<String>, scope: SyncScope) -> Self {
        Self {
            handler: handler.into(),
            scope,
            forced: false,
            page: None,
        }
    }

    /// Registered type key of the handler that should run.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// The requested scope.
    pub fn scope(&self) -> &SyncScope {
        &self.scope
    }

    /// True when staleness checks must be bypassed.
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Specific page to fetch, for handlers that page on demand.
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Sets the forced flag.
    pub fn forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    /// Sets a specific page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// A completion callback run after a sync task finishes.
pub type OnComplete = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// A submitted sync request: arguments plus completion callbacks, consumed
/// exactly once by the dispatcher.
pub struct SyncTask {
    dispatcher: Arc<SyncDispatcher>,
    args: SyncArgs,
    on_complete: Vec<OnComplete>,
}

impl SyncTask {
    pub(crate) fn new(dispatcher: Arc<SyncDispatcher>, args: SyncArgs) -> Self {
        Self {
            dispatcher,
            args,
            on_complete: Vec::new(),
        }
    }

    /// The arguments this task will run with.
    pub fn args(&self) -> &SyncArgs {
        &self.args
    }

    /// Chains a callback to run after the sync finishes. Callbacks run in
    /// registration order regardless of how the sync ends.
    pub fn on_complete<F, Fut>(mut self, block: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_complete.push(Box::new(move || Box::pin(block())));
        self
    }

    /// Runs the task in the caller's async context.
    pub async fn run(self) -> EngineResult<()> {
        self.dispatcher.run_task(self.args, self.on_complete).await
    }

    /// Fire-and-forget: runs the task on the shared runtime, logging any
    /// failure. Failures never propagate to the caller.
    pub fn launch(self) {
        let dispatcher = self.dispatcher;
        let args = self.args;
        let callbacks = self.on_complete;
        tokio::spawn(async move {
            if let Err(error) = dispatcher.run_task(args, callbacks).await {
                tracing::warn!(%error, "sync task failed");
            }
        });
    }

    /// Deferred mode: spawns the task and returns its handle. Dropping the
    /// handle detaches the task without cancelling it.
    pub fn spawn(self) -> JoinHandle<EngineResult<()>> {
        let dispatcher = self.dispatcher;
        let args = self.args;
        let callbacks = self.on_complete;
        tokio::spawn(async move { dispatcher.run_task(args, callbacks).await })
    }
}
