//! # Tidesync Engine
//!
//! The offline-first synchronization core: task dispatch, pagination fetch,
//! per-key staleness gating, per-key mutual exclusion, and the merge
//! algorithm reconciling locally edited and server-fetched state.
//!
//! This crate provides:
//! - A process-wide task dispatcher with a handler registry
//! - An async keyed mutex collapsing duplicate concurrent syncs
//! - Concurrent pagination fetch with page-level failure isolation
//! - The reconciler merging fetched records into the local store
//! - Per-resource sync configuration
//!
//! ## Architecture
//!
//! A caller builds [`SyncArgs`] and submits them to the [`SyncDispatcher`],
//! which looks up the registered [`SyncHandler`] and runs it. The handler
//! acquires its [`KeyedMutex`], consults the staleness record, fetches pages
//! from the remote API, and hands the aggregated payload to the
//! [`Reconciler`], which applies local-store writes and reports freshness
//! back through the staleness record.
//!
//! ## Key Invariants
//!
//! - At most one sync runs per resource key; waiters re-evaluate staleness
//! - Page 1 is inspected before any other page is scheduled
//! - All pages are buffered before the write transaction opens
//! - A failing task never cancels unrelated sibling tasks
//! - Completion callbacks run exactly once, in registration order
//! - A locally deleted record is never resurrected by a refresh

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dispatcher;
mod error;
mod handler;
mod mutex;
mod pages;
mod reconcile;
mod request;

pub use config::SyncConfig;
pub use dispatcher::SyncDispatcher;
pub use error::{EngineError, EngineResult};
pub use handler::SyncHandler;
pub use mutex::{KeyedMutex, KeyedMutexGuard};
pub use pages::fetch_pages;
pub use reconcile::{delete_orphans, ExistingIndex, Reconciler, DEFAULT_MERGE_DEPTH};
pub use request::{OnComplete, SyncArgs, SyncScope, SyncTask};
