//! # Tidesync Testkit
//!
//! Test fixtures for the tidesync workspace.
//!
//! This crate provides:
//! - Sample record types implementing the full entity contract
//!   ([`Contact`], [`EmailAddress`])
//! - A scripted page-serving API stub with a call counter ([`PagedApi`])
//!
//! Everything here is test tooling; nothing in the engine depends on it at
//! runtime.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod pages;
mod records;

pub use pages::PagedApi;
pub use records::{Contact, EmailAddress, CONTACT_TYPE, EMAIL_TYPE};
