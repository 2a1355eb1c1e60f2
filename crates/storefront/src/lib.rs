//! Cosmica Storefront library.
//!
//! Catalog and cart state for the toy storefront, plus the pure derivation
//! that turns the catalog and the page's query parameters into the product
//! listing.
//!
//! # Architecture
//!
//! - [`catalog::CatalogStore`] - single in-memory copy of the remote products
//! - [`cart::CartStore`] - session cart, priced against the current catalog
//! - [`listing`] - category/search filtering, sorting and category counts
//! - [`state::Storefront`] - composition root holding both stores
//! - [`api`] - product REST API seam and its `reqwest` implementation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod listing;
pub mod state;

pub use state::Storefront;
