//! # Tidesync Store
//!
//! Local store abstraction for the tidesync sync engine.
//!
//! This crate provides:
//! - The [`LocalStore`] trait the engine reconciles into
//! - Closure-scoped write transactions ([`StoreTransaction`])
//! - An in-memory reference implementation ([`MemoryStore`])
//!
//! The store is an injected collaborator: the engine needs find-by-id, one
//! index lookup, upsert, and delete, plus the locked/unlocked gate used
//! while the store waits for an external unlock. Encryption and richer
//! querying live with the embedding application.
//!
//! ## Key Invariants
//!
//! - One logical writer at a time per store; reads are unaffected
//! - A failed transaction closure leaves the store untouched
//! - Staleness records move through transactions together with the data
//!   they gate

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{LocalStore, StoreTransaction};
