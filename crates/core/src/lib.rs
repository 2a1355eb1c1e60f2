//! Cosmica Core - Shared domain types.
//!
//! This crate provides the types used across all Cosmica components:
//! - `storefront` - Catalog and cart state, listing derivation, API client
//! - `cli` - Terminal front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product identifiers, prices, products and product drafts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
