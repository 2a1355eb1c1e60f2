//! Application root: the catalog and cart composed side by side.
//!
//! A [`Storefront`] is built once at start-up and handed by reference to
//! every consumer. It owns no data of its own beyond the two stores and the
//! listing cache; it also enforces the UI-level rules the stores leave to
//! their callers, such as refusing to add products without stock.

use std::sync::Arc;

use cosmica_core::{Price, Product, ProductDraft, ProductId};
use tracing::{debug, instrument};

use crate::api::{ApiError, CatalogClient, ProductService};
use crate::cart::CartStore;
use crate::catalog::{CatalogError, CatalogStore, RefreshHandle};
use crate::config::StorefrontConfig;
use crate::error::{AppError, Result};
use crate::listing::{CategoryCount, ListingCache, ListingQuery};

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    /// The product is no longer in the catalog.
    pub orphaned: bool,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartLineView>,
    pub total_items: u64,
    pub total_price: Price,
}

/// Catalog, cart and listing cache for one storefront session.
pub struct Storefront<S> {
    catalog: CatalogStore<S>,
    cart: CartStore,
    listings: ListingCache,
}

impl Storefront<CatalogClient> {
    /// Build a storefront talking to the configured product API.
    ///
    /// Must be called from within a tokio runtime; the initial catalog fetch
    /// starts immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<(Self, RefreshHandle)> {
        let client = CatalogClient::new(&config.api)?;
        Ok(Self::new(client, config.listing_cache_capacity))
    }
}

impl<S> Storefront<S>
where
    S: ProductService + 'static,
{
    /// Build a storefront over any product service.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(service: S, listing_cache_capacity: u64) -> (Self, RefreshHandle) {
        let (catalog, initial) = CatalogStore::new(service);
        let storefront = Self {
            catalog,
            cart: CartStore::new(),
            listings: ListingCache::new(listing_cache_capacity),
        };
        (storefront, initial)
    }

    /// Get a reference to the catalog store.
    #[must_use]
    pub const fn catalog(&self) -> &CatalogStore<S> {
        &self.catalog
    }

    /// Get a reference to the cart.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Get a mutable reference to the cart.
    pub const fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    /// Filtered and sorted listing for the current catalog.
    #[must_use]
    pub fn listing(&self, query: &ListingQuery) -> Arc<Vec<Product>> {
        self.listings.listing(&self.catalog.snapshot(), query)
    }

    /// Category counts for the current catalog.
    #[must_use]
    pub fn categories(&self) -> Arc<Vec<CategoryCount>> {
        self.listings.categories(&self.catalog.snapshot())
    }

    /// Product detail lookup.
    ///
    /// Uses the loaded catalog first and falls back to the product service
    /// for products that are not (or not yet) loaded.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the service does not know the id, or
    /// the service error if the lookup fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn product_detail(&self, id: &ProductId) -> Result<Product> {
        if let Some(product) = self.catalog.product(id) {
            return Ok(product);
        }

        debug!("Product not in loaded catalog, asking the service");
        match self.catalog.service().get_product(id).await {
            Ok(product) => Ok(product),
            Err(ApiError::NotFound(_)) => Err(AppError::NotFound(id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Add one unit of a loaded product to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for ids not in the catalog and
    /// [`AppError::OutOfStock`] for products with zero stock.
    pub fn add_to_cart(&mut self, id: &ProductId) -> Result<()> {
        let product = self
            .catalog
            .product(id)
            .ok_or_else(|| AppError::NotFound(id.clone()))?;
        if !product.is_in_stock() {
            return Err(AppError::OutOfStock(id.clone()));
        }

        self.cart.add_to_cart(&product);
        Ok(())
    }

    /// Validate a draft and create it through the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Draft`] for drafts that break the data model and
    /// [`AppError::Catalog`] if the service rejects the product.
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product> {
        draft.check()?;
        Ok(self.catalog.create(draft).await?)
    }

    /// Validate a draft and apply it to an existing product.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Draft`] for drafts that break the data model,
    /// [`AppError::NotFound`] if the service does not know the id and
    /// [`AppError::Catalog`] for any other service failure.
    pub async fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> Result<Product> {
        draft.check()?;
        match self.catalog.update(id, draft).await {
            Ok(product) => Ok(product),
            Err(CatalogError::Update(ApiError::NotFound(_))) => {
                Err(AppError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Total cart price at current catalog prices.
    #[must_use]
    pub fn cart_total_price(&self) -> Price {
        self.cart.total_price(&self.catalog.products())
    }

    /// Resolved cart contents and totals.
    #[must_use]
    pub fn cart_summary(&self) -> CartSummary {
        let products = self.catalog.products();
        let resolved = self.cart.resolve(&products);

        CartSummary {
            lines: resolved
                .iter()
                .map(|line| CartLineView {
                    id: line.product.id.clone(),
                    name: line.product.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total,
                    orphaned: line.orphaned,
                })
                .collect(),
            total_items: self.cart.total_items(),
            total_price: resolved.iter().map(|line| line.line_total).sum(),
        }
    }
}
