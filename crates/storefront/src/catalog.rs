//! Catalog store: the single in-memory copy of the remote product list.
//!
//! The store starts loading as soon as it is constructed. Fetches run as
//! tokio tasks; each background refresh hands back a [`RefreshHandle`] whose
//! token lets the caller drop a result that arrives after nobody is
//! interested in it any more. A result that arrives after the store itself
//! has been dropped is discarded as well.
//!
//! Overlapping refreshes are not coordinated: whichever response resolves
//! last is the one left in the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use cosmica_core::{Product, ProductDraft, ProductId};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, ProductService};

/// Message shown to users when the product list cannot be fetched.
pub const FETCH_ERROR_MESSAGE: &str = "Error loading products";

/// Errors surfaced by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product list could not be fetched.
    #[error("Error loading products")]
    Fetch(#[source] ApiError),

    /// The product could not be created. The stored list is unchanged.
    #[error("Error creating product")]
    Create(#[source] ApiError),

    /// The product could not be updated. The stored list is unchanged.
    #[error("Error updating product")]
    Update(#[source] ApiError),

    /// The product could not be deleted. The stored list is unchanged.
    #[error("Error deleting product")]
    Delete(#[source] ApiError),
}

/// Loading state of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    /// A fetch is in flight.
    Loading,
    /// The last fetch succeeded.
    Ready,
    /// The last fetch failed; previously loaded products are still available.
    Failed(String),
}

impl CatalogStatus {
    /// The failure message, if the last fetch failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            Self::Loading | Self::Ready => None,
        }
    }
}

/// Consistent view of the catalog at one point in time.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Products in server order.
    pub products: Arc<Vec<Product>>,
    pub status: CatalogStatus,
    /// Increases on every committed change to `products`.
    pub generation: u64,
}

/// What happened to the result of a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched list replaced the stored one.
    Applied { count: usize },
    /// The fetch failed; the stored list was kept.
    Failed(String),
    /// The result was dropped: the token was cancelled or the store is gone.
    Discarded,
}

// =============================================================================
// Refresh tokens
// =============================================================================

/// Liveness token shared between a background refresh and its requester.
#[derive(Debug, Clone, Default)]
pub struct RefreshToken {
    cancelled: Arc<AtomicBool>,
}

impl RefreshToken {
    /// Ask the refresh not to commit its result.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Handle to a background refresh.
///
/// Dropping the handle does not cancel the refresh; call
/// [`cancel`](Self::cancel) for that.
#[derive(Debug)]
pub struct RefreshHandle {
    token: RefreshToken,
    task: JoinHandle<RefreshOutcome>,
}

impl RefreshHandle {
    /// Ask the refresh not to commit its result.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A clone of the liveness token, for consumers that outlive the handle.
    #[must_use]
    pub fn token(&self) -> RefreshToken {
        self.token.clone()
    }

    /// Returns `true` if the refresh has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the refresh to complete.
    pub async fn wait(self) -> RefreshOutcome {
        self.task.await.unwrap_or_else(|e| {
            warn!(error = %e, "Catalog refresh task did not complete");
            RefreshOutcome::Discarded
        })
    }
}

// =============================================================================
// CatalogStore
// =============================================================================

/// Process-wide product catalog.
///
/// Cheap to clone; clones share the same state. Readers always observe a
/// complete product list, never a partially applied one.
pub struct CatalogStore<S> {
    service: Arc<S>,
    state: Arc<RwLock<CatalogState>>,
}

impl<S> Clone for CatalogStore<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            state: Arc::clone(&self.state),
        }
    }
}

#[derive(Debug)]
struct CatalogState {
    products: Arc<Vec<Product>>,
    status: CatalogStatus,
    generation: u64,
    /// Refreshes started but not yet resolved.
    in_flight: usize,
    /// Status to fall back to if every pending refresh is discarded.
    settled: Option<CatalogStatus>,
}

impl CatalogState {
    fn new() -> Self {
        Self {
            products: Arc::new(Vec::new()),
            status: CatalogStatus::Loading,
            generation: 0,
            in_flight: 0,
            settled: None,
        }
    }

    fn begin_refresh(&mut self) {
        self.in_flight += 1;
        if self.status != CatalogStatus::Loading {
            self.settled = Some(self.status.clone());
        }
        self.status = CatalogStatus::Loading;
    }

    fn finish_refresh(&mut self, result: Option<Result<Vec<Product>, ApiError>>) -> RefreshOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            Some(Ok(products)) => {
                let count = products.len();
                self.products = Arc::new(products);
                self.status = CatalogStatus::Ready;
                self.settled = None;
                self.generation += 1;
                info!(count, generation = self.generation, "Catalog refreshed");
                RefreshOutcome::Applied { count }
            }
            Some(Err(error)) => {
                warn!(error = %error, kept = self.products.len(), "Catalog refresh failed");
                self.status = CatalogStatus::Failed(FETCH_ERROR_MESSAGE.to_string());
                self.settled = None;
                RefreshOutcome::Failed(FETCH_ERROR_MESSAGE.to_string())
            }
            None => {
                if self.in_flight == 0
                    && self.status == CatalogStatus::Loading
                    && let Some(previous) = self.settled.take()
                {
                    self.status = previous;
                }
                info!("Discarded catalog refresh result");
                RefreshOutcome::Discarded
            }
        }
    }

    fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            products: Arc::clone(&self.products),
            status: self.status.clone(),
            generation: self.generation,
        }
    }
}

impl<S> CatalogStore<S>
where
    S: ProductService + 'static,
{
    /// Create the store and start the initial fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(service: S) -> (Self, RefreshHandle) {
        let store = Self {
            service: Arc::new(service),
            state: Arc::new(RwLock::new(CatalogState::new())),
        };
        let initial = store.spawn_refresh();
        (store, initial)
    }

    /// Start a background refresh.
    ///
    /// The status switches to [`CatalogStatus::Loading`] immediately. The
    /// fetched list is committed when it arrives unless the returned handle
    /// was cancelled or the store has been dropped in the meantime.
    pub fn spawn_refresh(&self) -> RefreshHandle {
        self.write().begin_refresh();

        let token = RefreshToken::default();
        let task_token = token.clone();
        let service = Arc::clone(&self.service);
        let state: Weak<RwLock<CatalogState>> = Arc::downgrade(&self.state);

        let task = tokio::spawn(async move {
            let result = service.list_products().await;

            let Some(state) = state.upgrade() else {
                info!("Catalog dropped before refresh resolved");
                return RefreshOutcome::Discarded;
            };
            let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
            if task_token.is_cancelled() {
                guard.finish_refresh(None)
            } else {
                guard.finish_refresh(Some(result))
            }
        });

        RefreshHandle { token, task }
    }

    /// Fetch the product list and wait for it to be committed.
    ///
    /// The fetch runs as a background refresh, so dropping the returned
    /// future does not stop the result from being committed.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> RefreshOutcome {
        self.spawn_refresh().wait().await
    }

    /// Create a product and append it to the stored list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Create`] if the service rejects the draft or
    /// is unreachable. The stored list is left untouched.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, CatalogError> {
        let product = self
            .service
            .create_product(draft)
            .await
            .map_err(CatalogError::Create)?;

        let mut state = self.write();
        Arc::make_mut(&mut state.products).push(product.clone());
        state.generation += 1;
        info!(id = %product.id, "Product added to catalog");

        Ok(product)
    }

    /// Update a product remotely and replace the stored copy in place.
    ///
    /// A product that is not in the stored list is not added; the next
    /// refresh picks it up.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Update`] if the service call fails. The stored
    /// list is left untouched.
    #[instrument(skip(self, draft), fields(id = %id))]
    pub async fn update(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, CatalogError> {
        let product = self
            .service
            .update_product(id, draft)
            .await
            .map_err(CatalogError::Update)?;

        let mut state = self.write();
        let position = state.products.iter().position(|p| p.id == *id);
        if let Some(position) = position
            && let Some(slot) = Arc::make_mut(&mut state.products).get_mut(position)
        {
            *slot = product.clone();
            state.generation += 1;
            info!("Product updated in catalog");
        }

        Ok(product)
    }

    /// Delete a product remotely and drop it from the stored list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Delete`] if the service call fails. The stored
    /// list is left untouched.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), CatalogError> {
        self.service
            .delete_product(id)
            .await
            .map_err(CatalogError::Delete)?;

        let mut state = self.write();
        let before = state.products.len();
        Arc::make_mut(&mut state.products).retain(|product| product.id != *id);
        if state.products.len() != before {
            state.generation += 1;
        }

        Ok(())
    }
}

impl<S> CatalogStore<S> {
    /// A consistent view of products, status and generation.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.read().snapshot()
    }

    /// The current product list.
    #[must_use]
    pub fn products(&self) -> Arc<Vec<Product>> {
        Arc::clone(&self.read().products)
    }

    /// The current loading status.
    #[must_use]
    pub fn status(&self) -> CatalogStatus {
        self.read().status.clone()
    }

    /// Generation counter of the stored list.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Look up a loaded product by id.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<Product> {
        self.read()
            .products
            .iter()
            .find(|product| product.id == *id)
            .cloned()
    }

    /// The underlying product service.
    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
