//! Product API access.
//!
//! # Architecture
//!
//! - [`ProductService`] is the seam the catalog store talks to; tests swap in
//!   an in-memory implementation
//! - [`CatalogClient`] is the production implementation over `reqwest`
//! - The remote API is the source of truth - no local sync, direct calls
//!
//! # Endpoints
//!
//! All paths are relative to the configured base URL:
//! - `GET /productos` - full product list, in server order
//! - `GET /productos/{id}` - single product
//! - `POST /productos` - create a product from a draft, returns it with an id
//! - `PUT /productos/{id}` - replace a product's fields, returns the result
//! - `DELETE /productos/{id}` - remove a product
//!
//! # Example
//!
//! ```rust,ignore
//! use cosmica_storefront::api::{CatalogClient, ProductService};
//!
//! let client = CatalogClient::new(&config.api)?;
//! let products = client.list_products().await?;
//! ```

mod client;

pub use client::CatalogClient;

use std::future::Future;

use cosmica_core::{Product, ProductDraft, ProductId};
use thiserror::Error;

/// Errors that can occur when talking to the product API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Remote product operations.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`); background refreshes
///   run on the tokio runtime
/// - Every failure is reported through [`ApiError`]; callers decide whether it
///   is fatal
pub trait ProductService: Send + Sync {
    /// Fetch every product, in server order.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Fetch a single product by id.
    fn get_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Create a product. The returned product carries the assigned id.
    fn create_product(
        &self,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Replace every field of an existing product.
    fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Delete a product by id.
    fn delete_product(&self, id: &ProductId) -> impl Future<Output = Result<(), ApiError>> + Send;
}
