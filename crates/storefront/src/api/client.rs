//! `reqwest` implementation of the product API.

use std::sync::Arc;

use cosmica_core::{Product, ProductDraft, ProductId};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{ApiError, ProductService};
use crate::config::CatalogApiConfig;

/// Maximum number of body characters kept in logs and error messages.
const BODY_PREVIEW_CHARS: usize = 500;

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the product REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new product API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &CatalogApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/productos", self.inner.base_url)
    }

    fn product_url(&self, id: &ProductId) -> String {
        format!("{}/productos/{}", self.inner.base_url, id)
    }

    /// Read the response body and turn non-success statuses into errors.
    async fn read_body(response: reqwest::Response, what: &str) -> Result<String, ApiError> {
        let status = response.status();
        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let preview = preview(&body);
            tracing::error!(
                status = %status,
                body = %preview,
                "Product API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: preview,
            });
        }

        Ok(body)
    }

    /// Parse a JSON body, logging a preview when it does not match the model.
    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %preview(body),
                "Failed to parse product API response"
            );
            ApiError::Parse(e)
        })
    }
}

impl ProductService for CatalogClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let response = self.inner.client.get(self.collection_url()).send().await?;
        let body = Self::read_body(response, "product list").await?;
        let products: Vec<Product> = Self::parse(&body)?;

        debug!(count = products.len(), "Fetched product list");
        Ok(products)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let response = self.inner.client.get(self.product_url(id)).send().await?;
        let body = Self::read_body(response, &format!("product {id}")).await?;
        Self::parse(&body)
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        let response = self
            .inner
            .client
            .post(self.collection_url())
            .json(draft)
            .send()
            .await?;
        let body = Self::read_body(response, "product collection").await?;
        let product: Product = Self::parse(&body)?;

        debug!(id = %product.id, "Created product");
        Ok(product)
    }

    #[instrument(skip(self, draft), fields(id = %id))]
    async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let response = self
            .inner
            .client
            .put(self.product_url(id))
            .json(draft)
            .send()
            .await?;
        let body = Self::read_body(response, &format!("product {id}")).await?;
        let product: Product = Self::parse(&body)?;

        debug!("Updated product");
        Ok(product)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let response = self.inner.client.delete(self.product_url(id)).send().await?;
        Self::read_body(response, &format!("product {id}")).await?;

        debug!("Deleted product");
        Ok(())
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
