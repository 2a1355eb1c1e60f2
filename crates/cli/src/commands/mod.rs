//! CLI command implementations.

pub mod cart;
pub mod products;

use std::time::Duration;

use tracing::{info, warn};

use cosmica_storefront::Storefront;
use cosmica_storefront::api::CatalogClient;
use cosmica_storefront::catalog::RefreshOutcome;
use cosmica_storefront::config::StorefrontConfig;
use cosmica_storefront::error::AppError;

/// Pause before the first retry; doubles on each further attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Build a product API client from the environment.
///
/// For commands that write single products and never need the list.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the HTTP client cannot
/// be built.
pub fn client() -> Result<CatalogClient, AppError> {
    let config = StorefrontConfig::from_env()?;
    info!(base_url = %config.api.base_url, "Using product API");
    Ok(CatalogClient::new(&config.api)?)
}

/// Build a storefront from the environment and wait for the initial fetch.
///
/// A failed fetch is retried up to `retries` times. With `require_catalog`
/// set, a catalog that still failed to load is an error; otherwise the
/// storefront is returned empty.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the HTTP client cannot be
/// built, or the catalog is required and could not be loaded.
pub async fn connect(
    retries: u32,
    require_catalog: bool,
) -> Result<Storefront<CatalogClient>, AppError> {
    let config = StorefrontConfig::from_env()?;
    let (storefront, initial) = Storefront::from_config(&config)?;
    info!(base_url = %config.api.base_url, "Loading catalog");

    let mut outcome = initial.wait().await;
    let mut delay = RETRY_BASE_DELAY;
    for attempt in 1..=retries {
        if !matches!(outcome, RefreshOutcome::Failed(_)) {
            break;
        }
        warn!(attempt, retries, delay_ms = delay.as_millis(), "Retrying catalog fetch");
        tokio::time::sleep(delay).await;
        delay = delay.saturating_mul(2);
        outcome = storefront.catalog().refresh().await;
    }

    if require_catalog && let RefreshOutcome::Failed(message) = outcome {
        return Err(AppError::Unavailable(message));
    }

    Ok(storefront)
}
