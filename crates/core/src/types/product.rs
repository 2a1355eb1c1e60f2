//! Catalog product records.
//!
//! Field names on the wire are those served by the product API
//! (`nombre`, `precio`, `categoria`, ...). The Rust side uses English names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Price, ProductId};

/// A product as stored by the remote product service.
///
/// Immutable from the client's perspective; new products are only introduced
/// through an explicit create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned identifier.
    pub id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio")]
    pub price: Price,
    pub stock: u32,
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "descripcionCorta")]
    pub short_description: String,
    #[serde(rename = "descripcionLarga")]
    pub long_description: String,
    #[serde(rename = "envioSinCargo")]
    pub free_shipping: bool,
    /// Minimum recommended age in years.
    #[serde(rename = "edadDesde")]
    pub min_age: u32,
    /// Maximum recommended age in years. Not checked against `min_age`.
    #[serde(rename = "edadHasta")]
    pub max_age: u32,
    #[serde(rename = "foto")]
    pub image_url: String,
}

impl Product {
    /// Build a product from a draft and the identifier the server assigned.
    #[must_use]
    pub fn from_draft(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            name: draft.name,
            price: draft.price,
            stock: draft.stock,
            brand: draft.brand,
            category: draft.category,
            short_description: draft.short_description,
            long_description: draft.long_description,
            free_shipping: draft.free_shipping,
            min_age: draft.min_age,
            max_age: draft.max_age,
            image_url: draft.image_url,
        }
    }

    /// Returns `true` if at least one unit is available.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Human-readable recommended age range, e.g. `3-8 years`.
    #[must_use]
    pub fn age_range(&self) -> String {
        format!("{}-{} years", self.min_age, self.max_age)
    }
}

/// A product that has not been assigned an identifier yet.
///
/// This is the body of a product creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio")]
    pub price: Price,
    pub stock: u32,
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "descripcionCorta")]
    pub short_description: String,
    #[serde(rename = "descripcionLarga")]
    pub long_description: String,
    #[serde(rename = "envioSinCargo", default)]
    pub free_shipping: bool,
    #[serde(rename = "edadDesde")]
    pub min_age: u32,
    #[serde(rename = "edadHasta")]
    pub max_age: u32,
    #[serde(rename = "foto")]
    pub image_url: String,
}

/// A draft that violates a data model invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("price must not be negative (got {0})")]
    NegativePrice(Price),
    #[error("{0} must not be empty")]
    MissingField(&'static str),
}

impl ProductDraft {
    /// Check the invariants the data model guarantees for every product.
    ///
    /// Field-level presentation rules (lengths, allowed characters) are the
    /// form's business, not this type's.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError`] if the price is negative or the name is blank.
    pub fn check(&self) -> Result<(), DraftError> {
        if self.price.is_negative() {
            return Err(DraftError::NegativePrice(self.price));
        }
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingField("name"));
        }
        Ok(())
    }
}

impl From<Product> for ProductDraft {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            price: product.price,
            stock: product.stock,
            brand: product.brand,
            category: product.category,
            short_description: product.short_description,
            long_description: product.long_description,
            free_shipping: product.free_shipping,
            min_age: product.min_age,
            max_age: product.max_age,
            image_url: product.image_url,
        }
    }
}
