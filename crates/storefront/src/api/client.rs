//! HTTP implementation of [`StorefrontApi`].

use std::sync::Arc;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use capelli_core::{Address, CartLine, CatalogEntry, CredentialKind, Quantity};

use crate::config::ApiConfig;
use crate::session::SessionToken;

use super::cache::{CacheKey, CacheValue};
use super::wire::{
    AddToCartBody, AddressBody, AddressesResponse, CartQuantityBody, CartResponse, CartTitleBody,
    CredentialBody, IndexBody, LoginBody, ProductsResponse, SignupBody, TextResponse, TokenBody,
};
use super::{
    ApiError, AuthOutcome, CredentialOutcome, NewCartItem, StorefrontApi, USER_NOT_FOUND,
    credential_outcome, credential_text, login_outcome, signup_outcome,
};

/// How much of an error body is kept for logs and errors.
const BODY_EXCERPT: usize = 500;

/// Client for the storefront backend.
///
/// Cheaply cloneable. The catalog listing is cached for the configured TTL;
/// every per-user call goes to the network.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. no TLS
    /// backend is available).
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = (!config.product_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(16)
                .time_to_live(config.product_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        // The base URL always ends in `/`.
        format!("{}{path}", self.inner.base_url)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let response = self.inner.client.get(self.endpoint(path)).send().await?;
        Self::read(path, response).await
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(path))
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        Self::read(path, response).await
    }

    /// POST and accept any text response other than the unknown-user one.
    async fn acknowledge<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response: TextResponse = self.post(path, body).await?;
        let text = response.into_text();
        if text == USER_NOT_FOUND {
            return Err(ApiError::Rejected(text));
        }
        debug!(endpoint = path, response = %text, "Backend acknowledged");
        Ok(())
    }

    async fn read<R: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<R, ApiError> {
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let excerpt = body.chars().take(BODY_EXCERPT).collect::<String>();
            tracing::error!(
                endpoint = path,
                status = %status,
                body = %excerpt,
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: excerpt,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                endpoint = path,
                error = %e,
                body = %body.chars().take(BODY_EXCERPT).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }
}

impl StorefrontApi for ApiClient {
    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<CatalogEntry>, ApiError> {
        if let Some(cache) = &self.inner.cache
            && let Some(CacheValue::Products(entries)) = cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(entries);
        }

        let response: ProductsResponse = self.get("Products").await?;
        let entries = response.into_entries();

        if let Some(cache) = &self.inner.cache {
            cache
                .insert(CacheKey::Products, CacheValue::Products(entries.clone()))
                .await;
        }

        Ok(entries)
    }

    #[instrument(skip(self, email, password))]
    async fn signup(
        &self,
        email: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthOutcome, ApiError> {
        let body = SignupBody {
            email,
            username,
            password: password.expose_secret(),
        };
        let response: TextResponse = self.post("signup", &body).await?;
        Ok(signup_outcome(response.into_text()))
    }

    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &SecretString) -> Result<AuthOutcome, ApiError> {
        let body = LoginBody {
            username,
            password: password.expose_secret(),
        };
        let response: TextResponse = self.post("login", &body).await?;
        Ok(login_outcome(response.into_text()))
    }

    #[instrument(skip_all)]
    async fn logout(&self, token: &SessionToken) -> Result<(), ApiError> {
        let _: TextResponse = self
            .post(
                "logout",
                &TokenBody {
                    token: token.expose(),
                },
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(title = %item.title, quantity = %item.quantity))]
    async fn add_to_cart(&self, token: &SessionToken, item: &NewCartItem) -> Result<(), ApiError> {
        let body = AddToCartBody {
            token: token.expose(),
            product_title: &item.title,
            product_image: &item.image,
            product_price: item.price,
            quantity: item.quantity.get(),
        };
        self.acknowledge("addToCart", &body).await
    }

    #[instrument(skip_all)]
    async fn cart(&self, token: &SessionToken) -> Result<Vec<CartLine>, ApiError> {
        let response: CartResponse = self
            .post(
                "getCart",
                &TokenBody {
                    token: token.expose(),
                },
            )
            .await?;
        response.into_lines()
    }

    #[instrument(skip(self, token))]
    async fn update_cart_quantity(
        &self,
        token: &SessionToken,
        title: &str,
        quantity: Quantity,
    ) -> Result<(), ApiError> {
        let body = CartQuantityBody {
            token: token.expose(),
            product_title: title,
            quantity: quantity.get(),
        };
        self.acknowledge("updateCartQuantity", &body).await
    }

    #[instrument(skip(self, token))]
    async fn delete_cart_line(&self, token: &SessionToken, title: &str) -> Result<(), ApiError> {
        let body = CartTitleBody {
            token: token.expose(),
            product_title: title,
        };
        self.acknowledge("deleteProduct", &body).await
    }

    #[instrument(skip_all)]
    async fn addresses(&self, token: &SessionToken) -> Result<Vec<Address>, ApiError> {
        let response: AddressesResponse = self
            .post(
                "getAddresses",
                &TokenBody {
                    token: token.expose(),
                },
            )
            .await?;
        response.into_addresses()
    }

    #[instrument(skip_all)]
    async fn add_address(&self, token: &SessionToken, address: &Address) -> Result<(), ApiError> {
        self.acknowledge("addAddress", &AddressBody::new(token.expose(), address, None))
            .await
    }

    #[instrument(skip(self, token, address))]
    async fn change_address(
        &self,
        token: &SessionToken,
        index: usize,
        address: &Address,
    ) -> Result<(), ApiError> {
        self.acknowledge(
            "changeAddress",
            &AddressBody::new(token.expose(), address, Some(index)),
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn delete_address(&self, token: &SessionToken, index: usize) -> Result<(), ApiError> {
        let body = IndexBody {
            token: token.expose(),
            index,
        };
        self.acknowledge("deleteAddress", &body).await
    }

    #[instrument(skip_all)]
    async fn username(&self, token: &SessionToken) -> Result<String, ApiError> {
        let response: TextResponse = self
            .post(
                "getUsername",
                &TokenBody {
                    token: token.expose(),
                },
            )
            .await?;
        credential_text(response.into_text())
    }

    #[instrument(skip_all)]
    async fn email(&self, token: &SessionToken) -> Result<String, ApiError> {
        let response: TextResponse = self
            .post(
                "getEmail",
                &TokenBody {
                    token: token.expose(),
                },
            )
            .await?;
        credential_text(response.into_text())
    }

    #[instrument(skip(self, token, value))]
    async fn change_credential(
        &self,
        token: &SessionToken,
        kind: CredentialKind,
        value: &SecretString,
    ) -> Result<CredentialOutcome, ApiError> {
        let body = CredentialBody {
            token: token.expose(),
            selected: kind,
            new_credential: value.expose_secret(),
        };
        let response: TextResponse = self.post("changeCredential", &body).await?;
        Ok(credential_outcome(response.into_text()))
    }
}
