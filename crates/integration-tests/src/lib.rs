//! Integration tests for the Cosmica storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cosmica-integration-tests
//! ```
//!
//! No external services are needed: catalog tests run against
//! [`MockProductService`], HTTP client tests against a throwaway local
//! listener.
//!
//! # Test Categories
//!
//! - `catalog_store` - catalog loading, mutation and refresh races
//! - `storefront` - cart and listing behavior through the composition root
//! - `http_client` - the `reqwest` product client against a local server

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cosmica_core::{Price, Product, ProductDraft, ProductId};
use cosmica_storefront::api::{ApiError, ProductService};
use tokio::sync::oneshot;

// ============================================================================
// Fixtures
// ============================================================================

/// Build a product with the fields the listing and cart care about.
#[must_use]
pub fn product(id: &str, name: &str, category: &str, price: u32, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Price::from(price),
        stock,
        brand: "Cosmica".to_string(),
        category: category.to_string(),
        short_description: format!("{name} short description"),
        long_description: format!("{name} long description"),
        free_shipping: false,
        min_age: 3,
        max_age: 10,
        image_url: format!("https://img.example.com/{id}.jpg"),
    }
}

/// A valid draft for a new product.
#[must_use]
pub fn draft(name: &str, category: &str, price: u32) -> ProductDraft {
    product("0", name, category, price, 5).into()
}

/// Ids of a product list, in order.
#[must_use]
pub fn ids(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.id.as_str()).collect()
}

// ============================================================================
// MockProductService
// ============================================================================

/// One scripted answer to `list_products`.
struct ListStep {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<Vec<Product>, u16>,
}

#[derive(Default)]
struct MockState {
    /// Server-side products, used for lookups and unscripted list calls.
    products: Vec<Product>,
    script: VecDeque<ListStep>,
    fail_writes: bool,
    list_calls: usize,
    next_id: u32,
}

/// In-memory product service with scriptable list responses.
///
/// Unscripted list calls return the server-side product list. Gated steps
/// hold the response until the returned sender fires (or is dropped), which
/// lets tests control the order in which overlapping fetches resolve.
#[derive(Default)]
pub struct MockProductService {
    state: Mutex<MockState>,
}

impl MockProductService {
    /// A service whose server-side list holds `products`.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let next_id = products
            .iter()
            .filter_map(|p| p.id.as_str().parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            state: Mutex::new(MockState {
                products,
                next_id,
                ..MockState::default()
            }),
        }
    }

    /// Answer the next list call with `products`.
    pub fn push_list(&self, products: Vec<Product>) {
        self.push(None, Ok(products));
    }

    /// Answer the next list call with an HTTP error status.
    pub fn push_list_failure(&self, status: u16) {
        self.push(None, Err(status));
    }

    /// Answer the next list call with `products` once the sender fires.
    pub fn push_gated_list(&self, products: Vec<Product>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(Some(rx), Ok(products));
        tx
    }

    /// Answer the next list call with an error once the sender fires.
    pub fn push_gated_failure(&self, status: u16) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(Some(rx), Err(status));
        tx
    }

    /// Make create, update and delete calls fail with a 500.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of list calls received so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Yield until at least `count` list calls have been received.
    pub async fn wait_for_list_calls(&self, count: usize) {
        while self.list_calls() < count {
            tokio::task::yield_now().await;
        }
    }

    fn push(&self, gate: Option<oneshot::Receiver<()>>, result: Result<Vec<Product>, u16>) {
        self.lock().script.push_back(ListStep { gate, result });
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn status_error(status: u16) -> ApiError {
    ApiError::Status {
        status,
        body: "scripted failure".to_string(),
    }
}

impl ProductService for MockProductService {
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let step = {
            let mut state = self.lock();
            state.list_calls += 1;
            state.script.pop_front().unwrap_or_else(|| ListStep {
                gate: None,
                result: Ok(state.products.clone()),
            })
        };

        if let Some(gate) = step.gate {
            // A dropped sender releases the gate too
            let _ = gate.await;
        }
        step.result.map_err(status_error)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.lock()
            .products
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(status_error(500));
        }

        let id = ProductId::new(state.next_id.to_string());
        state.next_id += 1;
        let product = Product::from_draft(id, draft.clone());
        state.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(status_error(500));
        }

        let slot = state
            .products
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;
        *slot = Product::from_draft(id.clone(), draft.clone());
        Ok(slot.clone())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(status_error(500));
        }

        let before = state.products.len();
        state.products.retain(|p| p.id != *id);
        if state.products.len() == before {
            return Err(ApiError::NotFound(format!("product {id}")));
        }
        Ok(())
    }
}
