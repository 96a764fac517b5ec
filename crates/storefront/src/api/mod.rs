//! Remote storefront API.
//!
//! Every backend endpoint is a single JSON request with a single typed
//! result. The backend signals domain outcomes with plain strings
//! (`"No Cart"`, `"User not found!"`, a 32-character token); those are
//! converted into tagged types here so nothing above this module compares
//! response text.
//!
//! # Endpoints
//!
//! | Method | Path | Result |
//! |---|---|---|
//! | GET | `Products` | catalog rows |
//! | POST | `signup`, `login` | [`AuthOutcome`] |
//! | POST | `getCart` | cart records |
//! | POST | `getAddresses` | address records |
//! | POST | `getUsername`, `getEmail` | credential text |
//! | POST | `changeCredential` | [`CredentialOutcome`] |
//! | POST | `logout`, `addToCart`, `updateCartQuantity`, `deleteProduct`, `addAddress`, `changeAddress`, `deleteAddress` | acknowledgement |

mod cache;
mod call;
mod client;
mod wire;

pub use call::{ApiCall, ApiReply};
pub use client::ApiClient;

use std::future::Future;

use secrecy::SecretString;
use thiserror::Error;

use capelli_core::{Address, CartLine, CatalogEntry, CredentialKind, Price, Quantity, RecordError};

use crate::session::SessionToken;

/// Response text the backend uses for an unknown token or bad login.
pub const USER_NOT_FOUND: &str = "User not found!";

/// Response text for a successful credential change.
pub const CREDENTIAL_CHANGED: &str = "Credential changed!";

/// Length of a token issued on signup.
pub const SIGNUP_TOKEN_LEN: usize = 32;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// First part of the response body
        body: String,
    },

    /// The body was not the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A cart or address record was malformed.
    #[error("Malformed record: {0}")]
    Record(#[from] RecordError),

    /// The backend refused the request (e.g. unknown token).
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// Whether this is a transport or protocol fault rather than a domain
    /// rejection. Faults are worth reporting; rejections are not.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Result of a login or signup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The backend issued a session token.
    Authenticated(SessionToken),
    /// The backend refused; the text is shown to the shopper.
    Rejected(String),
}

/// Result of a credential change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOutcome {
    /// The credential was updated.
    Changed,
    /// The backend refused; the text is shown to the shopper.
    Rejected(String),
}

/// A product being added to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub title: String,
    pub image: String,
    pub price: Price,
    pub quantity: Quantity,
}

/// Backend operations used by the screens.
///
/// Implemented by [`ApiClient`] over HTTP, and by in-memory fakes in tests.
/// No method retries.
pub trait StorefrontApi {
    /// Fetch the catalog listing.
    fn products(&self) -> impl Future<Output = Result<Vec<CatalogEntry>, ApiError>>;

    /// Create an account.
    fn signup(
        &self,
        email: &str,
        username: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<AuthOutcome, ApiError>>;

    /// Exchange credentials for a session token.
    fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<AuthOutcome, ApiError>>;

    /// Invalidate a session token server-side.
    fn logout(&self, token: &SessionToken) -> impl Future<Output = Result<(), ApiError>>;

    /// Add a product to the cart.
    fn add_to_cart(
        &self,
        token: &SessionToken,
        item: &NewCartItem,
    ) -> impl Future<Output = Result<(), ApiError>>;

    /// Fetch the cart. An empty cart is an empty list.
    fn cart(&self, token: &SessionToken) -> impl Future<Output = Result<Vec<CartLine>, ApiError>>;

    /// Set the quantity of the line titled `title`.
    fn update_cart_quantity(
        &self,
        token: &SessionToken,
        title: &str,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), ApiError>>;

    /// Remove the line titled `title`.
    fn delete_cart_line(
        &self,
        token: &SessionToken,
        title: &str,
    ) -> impl Future<Output = Result<(), ApiError>>;

    /// Fetch saved addresses. No addresses is an empty list.
    fn addresses(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<Vec<Address>, ApiError>>;

    /// Append an address.
    fn add_address(
        &self,
        token: &SessionToken,
        address: &Address,
    ) -> impl Future<Output = Result<(), ApiError>>;

    /// Overwrite the address at `index`.
    fn change_address(
        &self,
        token: &SessionToken,
        index: usize,
        address: &Address,
    ) -> impl Future<Output = Result<(), ApiError>>;

    /// Delete the address at `index`. Later addresses shift down by one.
    fn delete_address(
        &self,
        token: &SessionToken,
        index: usize,
    ) -> impl Future<Output = Result<(), ApiError>>;

    /// Current username.
    fn username(&self, token: &SessionToken) -> impl Future<Output = Result<String, ApiError>>;

    /// Current email.
    fn email(&self, token: &SessionToken) -> impl Future<Output = Result<String, ApiError>>;

    /// Change one credential.
    fn change_credential(
        &self,
        token: &SessionToken,
        kind: CredentialKind,
        value: &SecretString,
    ) -> impl Future<Output = Result<CredentialOutcome, ApiError>>;
}

// =============================================================================
// Response interpretation
// =============================================================================

/// Interpret a signup response: success is exactly a 32-character token.
#[must_use]
pub fn signup_outcome(response: String) -> AuthOutcome {
    if response.chars().count() == SIGNUP_TOKEN_LEN {
        AuthOutcome::Authenticated(SessionToken::new(response))
    } else {
        AuthOutcome::Rejected(response)
    }
}

/// Interpret a login response: anything but the not-found text or an empty
/// string is the token.
#[must_use]
pub fn login_outcome(response: String) -> AuthOutcome {
    if response.is_empty() || response == USER_NOT_FOUND {
        let message = if response.is_empty() {
            USER_NOT_FOUND.to_string()
        } else {
            response
        };
        AuthOutcome::Rejected(message)
    } else {
        AuthOutcome::Authenticated(SessionToken::new(response))
    }
}

/// Interpret a credential change response.
#[must_use]
pub fn credential_outcome(response: String) -> CredentialOutcome {
    if response == CREDENTIAL_CHANGED {
        CredentialOutcome::Changed
    } else {
        CredentialOutcome::Rejected(response)
    }
}

/// Interpret a username/email lookup.
///
/// # Errors
///
/// Returns `ApiError::Rejected` when the token is unknown.
pub fn credential_text(response: String) -> Result<String, ApiError> {
    if response == USER_NOT_FOUND {
        Err(ApiError::Rejected(response))
    } else {
        Ok(response)
    }
}
