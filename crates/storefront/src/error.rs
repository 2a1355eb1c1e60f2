//! Unified error handling.
//!
//! Provides an `AppError` type for operations that cross the catalog, cart
//! and configuration layers. Front ends show [`AppError::user_message`] and
//! log the full error chain.

use cosmica_core::{DraftError, ProductId};
use thiserror::Error;

use crate::api::ApiError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Product API call failed.
    #[error("Product API error: {0}")]
    Api(#[from] ApiError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Product draft violates the data model.
    #[error("Invalid product: {0}")]
    Draft(#[from] DraftError),

    /// Product not found.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Product cannot be added to the cart because it has no stock.
    #[error("Out of stock: {0}")]
    OutOfStock(ProductId),

    /// The catalog could not be loaded and there is nothing to show.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Message safe to show to an end user.
    ///
    /// Transport and parsing details are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::NotFound(what)) => format!("Not found: {what}"),
            Self::Api(_) => "External service error".to_string(),
            // The catalog error's own message is already generic
            Self::Catalog(err) => err.to_string(),
            Self::Config(_)
            | Self::Draft(_)
            | Self::NotFound(_)
            | Self::OutOfStock(_)
            | Self::Unavailable(_)
            | Self::BadRequest(_) => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound(ProductId::new("9"));
        assert_eq!(err.to_string(), "Product not found: 9");

        let err = AppError::BadRequest("missing file".to_string());
        assert_eq!(err.to_string(), "Bad request: missing file");
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = AppError::Api(ApiError::Status {
            status: 502,
            body: "<html>upstream stack trace</html>".to_string(),
        });
        assert_eq!(err.user_message(), "External service error");

        let err = AppError::Catalog(CatalogError::Create(ApiError::Status {
            status: 500,
            body: "db down".to_string(),
        }));
        assert_eq!(err.user_message(), "Error creating product");
    }

    #[test]
    fn test_user_message_keeps_actionable_errors() {
        let err = AppError::OutOfStock(ProductId::new("3"));
        assert_eq!(err.user_message(), "Out of stock: 3");

        let err = AppError::Api(ApiError::NotFound("product 4".to_string()));
        assert_eq!(err.user_message(), "Not found: product 4");
    }
}
