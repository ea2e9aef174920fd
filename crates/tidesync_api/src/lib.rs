//! # Tidesync API
//!
//! JSON:API data contracts for the tidesync sync engine.
//!
//! This crate provides:
//! - The parsed response envelope ([`Envelope`]) with pagination meta and
//!   payload errors
//! - Page-level response handling ([`ApiResponse`]) with success/error
//!   branching and aggregation
//! - Partial-update write envelopes carrying only changed fields
//!
//! The wire codec itself lives with the caller; these types describe what a
//! parsed page looks like and how the engine branches on it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
mod response;
mod update;

pub use envelope::{ApiErrorDetail, Envelope, Meta, Pagination};
pub use response::{aggregate_pages, has_page_errors, ApiResponse, ResponseChain};
pub use update::{partial_update, WriteEnvelope, WriteResource};

/// Attribute name for server-side creation time.
pub const JSON_ATTR_CREATED_AT: &str = "created_at";

/// Attribute name for server-side modification time.
pub const JSON_ATTR_UPDATED_AT: &str = "updated_at";

/// Concurrency-stamp attribute carried on every partial update.
pub const JSON_ATTR_UPDATED_IN_DB_AT: &str = "updated_in_db_at";

/// Error `detail` prefix reporting a rejected concurrency stamp. The
/// affected resource needs a forced resync instead of a write retry.
pub const ERROR_STALE_STAMP_PREFIX: &str =
    "Updated in db at is not equal to the current value in the database";
