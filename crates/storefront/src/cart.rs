//! Client-side shopping cart.
//!
//! The cart is session state: it lives for the process and is never
//! persisted. Lines are keyed by product id and kept in the order products
//! were first added.
//!
//! Pricing is resolved at read time against the current catalog, so a price
//! change in the catalog shows up immediately in an open cart. Each line also
//! keeps the product data captured the last time the product was added; when
//! a product disappears from the catalog the line stays in the cart, priced
//! from that captured data and flagged as orphaned.

use std::collections::HashMap;
use std::num::NonZeroU32;

use cosmica_core::{Price, Product, ProductId};
use tracing::debug;

/// One product's presence in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    product: Product,
    quantity: NonZeroU32,
}

impl CartLine {
    /// Id of the referenced product.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// Product data as captured when the product was last added.
    #[must_use]
    pub const fn captured_product(&self) -> &Product {
        &self.product
    }

    /// Number of units, always at least one.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity.get()
    }
}

/// A cart line resolved against the current catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine<'a> {
    /// Current catalog product, or the captured data if the product is gone.
    pub product: &'a Product,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    /// `true` if the product is no longer in the catalog.
    pub orphaned: bool,
}

/// Cart state: lines plus the visibility flag of the cart panel.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
    open: bool,
}

impl CartStore {
    /// Create an empty, closed cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`.
    ///
    /// Creates a line with quantity 1 or increments the existing line. Stock
    /// is not checked here.
    pub fn add_to_cart(&mut self, product: &Product) {
        if let Some(line) = self.line_mut(&product.id) {
            line.quantity = line.quantity.saturating_add(1);
            line.product = product.clone();
            debug!(id = %product.id, quantity = line.quantity.get(), "Incremented cart line");
        } else {
            self.lines.push(CartLine {
                product: product.clone(),
                quantity: NonZeroU32::MIN,
            });
            debug!(id = %product.id, "Added cart line");
        }
    }

    /// Remove the line for `id`. Returns `true` if a line was removed.
    pub fn remove_from_cart(&mut self, id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product.id != *id);
        before != self.lines.len()
    }

    /// Replace the quantity of an existing line.
    ///
    /// Quantities below 1 are rejected and leave the line untouched; use
    /// [`remove_from_cart`](Self::remove_from_cart) to delete a line. Unknown
    /// ids are ignored. Returns `true` if the quantity was changed.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) -> bool {
        let Some(quantity) = u32::try_from(quantity).ok().and_then(NonZeroU32::new) else {
            debug!(id = %id, quantity, "Rejected cart quantity update");
            return false;
        };

        match self.line_mut(id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove every line.
    pub fn clear_cart(&mut self) {
        self.lines.clear();
    }

    /// All lines, in the order their products were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `id`, if any.
    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == *id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity.get())).sum()
    }

    /// Sum of price × quantity, using current catalog prices.
    #[must_use]
    pub fn total_price(&self, catalog: &[Product]) -> Price {
        self.resolve(catalog).iter().map(|line| line.line_total).sum()
    }

    /// Resolve every line against the current catalog.
    #[must_use]
    pub fn resolve<'a>(&'a self, catalog: &'a [Product]) -> Vec<ResolvedLine<'a>> {
        let by_id: HashMap<&ProductId, &Product> =
            catalog.iter().map(|product| (&product.id, product)).collect();

        self.lines
            .iter()
            .map(|line| {
                let current = by_id.get(&line.product.id).copied();
                let product = current.unwrap_or(&line.product);
                let quantity = line.quantity.get();
                ResolvedLine {
                    product,
                    quantity,
                    unit_price: product.price,
                    line_total: product.price.times(quantity),
                    orphaned: current.is_none(),
                }
            })
            .collect()
    }

    /// Whether the cart panel is shown.
    #[must_use]
    pub const fn is_cart_open(&self) -> bool {
        self.open
    }

    /// Show or hide the cart panel. Lines are not affected.
    pub const fn set_cart_open(&mut self, open: bool) {
        self.open = open;
    }

    fn line_mut(&mut self, id: &ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product.id == *id)
    }
}
