//! # Tidesync Model
//!
//! Data-model contracts for the tidesync sync engine.
//!
//! This crate provides:
//! - Change tracking for offline edits ([`ChangeState`])
//! - The object-safe record contract ([`Entity`])
//! - Per-key staleness records ([`SyncStamp`])
//!
//! ## Key Invariants
//!
//! - A field may only be marked changed while tracking is enabled
//! - A record "has pending changes" exactly when its changed-field set is
//!   non-empty
//! - A staleness record is only persisted together with the data it gates

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change;
mod entity;
mod stamp;

pub use change::ChangeState;
pub use entity::{clear_changed_matching, merge_changed_fields, Entity};
pub use stamp::{SyncStamp, KEY_SEPARATOR};
