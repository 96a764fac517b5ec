//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `CAPELLI_API_BASE_URL` - Backend base URL (default: `https://adrielcapelli.pythonanywhere.com`)
//! - `CAPELLI_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `CAPELLI_PRODUCT_CACHE_TTL_SECS` - Product listing cache TTL, 0 disables (default: 300)
//! - `CAPELLI_SESSION_FILE` - Where the session token is persisted (default: `.capelli/session.json`)
//! - `CAPELLI_CART_MUTATIONS` - `optimistic` or `rollback` (default: optimistic)
//! - `CAPELLI_CATEGORIES` - Comma-separated category menu (default: `Home,Clippers,Trimmers,Shavers`)
//! - `CAPELLI_BANNER_IMAGE` - Home banner image URL, empty disables
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0-1.0 (default: 1.0)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use capelli_core::Banner;

const DEFAULT_BASE_URL: &str = "https://adrielcapelli.pythonanywhere.com";
const DEFAULT_BANNER_IMAGE: &str = "https://i.imgur.com/Ysr5EP8.jpg";
const DEFAULT_CATEGORIES: &str = "Home,Clippers,Trimmers,Shavers";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How the cart reacts when a quantity change or removal fails server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPolicy {
    /// Keep the local change and show a notice.
    #[default]
    Optimistic,
    /// Restore the line as it was before the change.
    Rollback,
}

impl FromStr for MutationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(Self::Optimistic),
            "rollback" => Ok(Self::Rollback),
            other => Err(format!("expected `optimistic` or `rollback`, got `{other}`")),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Session token file
    pub session_file: PathBuf,
    /// Storefront presentation settings passed to every screen
    pub storefront: StorefrontSettings,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Product listing cache TTL (zero disables the cache)
    pub product_cache_ttl: Duration,
}

/// Static storefront data that screens render.
#[derive(Debug, Clone)]
pub struct StorefrontSettings {
    /// Category menu labels; the first entry is the home page itself
    pub categories: Vec<String>,
    /// Banner shown at the top of the home listing
    pub banner: Option<Banner>,
    /// Cart mutation failure policy
    pub mutation_policy: MutationPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // The constant is a valid absolute URL.
        #[allow(clippy::unwrap_used)]
        let base_url = parse_base_url(DEFAULT_BASE_URL).unwrap();
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            product_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            categories: parse_list(DEFAULT_CATEGORIES),
            banner: Some(default_banner(DEFAULT_BANNER_IMAGE)),
            mutation_policy: MutationPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let session_file = PathBuf::from(get_env_or_default(
            "CAPELLI_SESSION_FILE",
            ".capelli/session.json",
        ));
        let storefront = StorefrontSettings::from_env()?;

        let sentry_sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .map_err(|e| ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string()))?;

        Ok(Self {
            api,
            session_file,
            storefront,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&get_env_or_default("CAPELLI_API_BASE_URL", DEFAULT_BASE_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("CAPELLI_API_BASE_URL".to_string(), e))?;
        let timeout = get_secs("CAPELLI_HTTP_TIMEOUT_SECS", 30)?;
        let product_cache_ttl = get_secs("CAPELLI_PRODUCT_CACHE_TTL_SECS", 300)?;

        Ok(Self {
            base_url,
            timeout,
            product_cache_ttl,
        })
    }
}

impl StorefrontSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let categories = parse_list(&get_env_or_default("CAPELLI_CATEGORIES", DEFAULT_CATEGORIES));
        if categories.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CAPELLI_CATEGORIES".to_string(),
                "at least one category is required".to_string(),
            ));
        }

        let banner_image = get_env_or_default("CAPELLI_BANNER_IMAGE", DEFAULT_BANNER_IMAGE);
        let banner = (!banner_image.trim().is_empty()).then(|| default_banner(banner_image.trim()));

        let mutation_policy = get_env_or_default("CAPELLI_CART_MUTATIONS", "optimistic")
            .parse::<MutationPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("CAPELLI_CART_MUTATIONS".to_string(), e))?;

        Ok(Self {
            categories,
            banner,
            mutation_policy,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a duration in whole seconds.
fn get_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    get_env_or_default(key, &default.to_string())
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the API base URL, requiring http(s) and a trailing slash so that
/// endpoint paths join under it instead of replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Split a comma-separated list, dropping blank entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn default_banner(image: &str) -> Banner {
    Banner {
        title: "banner1".to_string(),
        image: image.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("http://localhost:8080/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/");
        assert_eq!(url.join("getCart").unwrap().as_str(), "http://localhost:8080/api/getCart");
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(parse_base_url("ftp://example.com").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" Home, Clippers ,,Shavers "), vec!["Home", "Clippers", "Shavers"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn test_mutation_policy_from_str() {
        assert_eq!("Rollback".parse::<MutationPolicy>().unwrap(), MutationPolicy::Rollback);
        assert_eq!(" optimistic".parse::<MutationPolicy>().unwrap(), MutationPolicy::Optimistic);
        assert!("eventual".parse::<MutationPolicy>().is_err());
    }

    #[test]
    fn test_defaults() {
        let api = ApiConfig::default();
        assert_eq!(api.base_url.as_str(), "https://adrielcapelli.pythonanywhere.com/");
        assert_eq!(api.product_cache_ttl, Duration::from_secs(300));

        let settings = StorefrontSettings::default();
        assert_eq!(settings.categories.first().map(String::as_str), Some("Home"));
        assert_eq!(settings.categories.len(), 4);
        assert!(settings.banner.is_some());
        assert_eq!(settings.mutation_policy, MutationPolicy::Optimistic);
    }
}
