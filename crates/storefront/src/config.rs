//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CATALOG_API_BASE_URL` - Base URL of the product API
//!   (default: `https://6860b9808e7486408443d77e.mockapi.io`)
//! - `CATALOG_API_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
//! - `LISTING_CACHE_CAPACITY` - Maximum memoized listings (default: 256)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Mock API the storefront talks to when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://6860b9808e7486408443d77e.mockapi.io";
const DEFAULT_TIMEOUT_SECS: &str = "10";
const DEFAULT_LISTING_CACHE_CAPACITY: &str = "256";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Product API configuration
    pub api: CatalogApiConfig,
    /// Maximum number of derived listings kept in memory
    pub listing_cache_capacity: u64,
}

/// Product API configuration.
#[derive(Debug, Clone)]
pub struct CatalogApiConfig {
    /// Base URL without the `/productos` path, no trailing slash
    pub base_url: String,
    /// Upper bound for a single request
    pub timeout: Duration,
}

impl Default for CatalogApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api = CatalogApiConfig::from_lookup(&lookup)?;
        let listing_cache_capacity =
            get_or_default(&lookup, "LISTING_CACHE_CAPACITY", DEFAULT_LISTING_CACHE_CAPACITY)
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("LISTING_CACHE_CAPACITY".to_string(), e.to_string())
                })?;

        Ok(Self {
            api,
            listing_cache_capacity,
        })
    }
}

impl CatalogApiConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = validate_base_url(&get_or_default(
            lookup,
            "CATALOG_API_BASE_URL",
            DEFAULT_API_BASE_URL,
        ))?;

        let timeout_secs = get_or_default(lookup, "CATALOG_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CATALOG_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_API_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Check that the base URL is an absolute http(s) URL and strip any trailing slash.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("CATALOG_API_BASE_URL".to_string(), reason);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("must have a host".to_string()));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}
