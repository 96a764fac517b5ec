//! Requests as data.
//!
//! Screens never hold a client; they return an [`ApiCall`] and later receive
//! the matching [`ApiReply`]. Replies echo whatever the screen needs to match
//! them up again (a fetch generation, a line title and mutation sequence, an
//! address index).

use secrecy::SecretString;

use capelli_core::{Address, CartLine, CatalogEntry, CredentialKind, Quantity};

use crate::session::SessionToken;

use super::{ApiError, AuthOutcome, CredentialOutcome, NewCartItem, StorefrontApi};

/// A request a screen wants sent.
#[derive(Debug, Clone)]
pub enum ApiCall {
    Products,
    Signup {
        email: String,
        username: String,
        password: SecretString,
    },
    Login {
        username: String,
        password: SecretString,
    },
    Logout {
        token: SessionToken,
    },
    AddToCart {
        token: SessionToken,
        item: NewCartItem,
    },
    GetCart {
        token: SessionToken,
        generation: u64,
    },
    UpdateQuantity {
        token: SessionToken,
        title: String,
        quantity: Quantity,
        seq: u64,
    },
    DeleteCartLine {
        token: SessionToken,
        title: String,
        seq: u64,
    },
    GetAddresses {
        token: SessionToken,
        generation: u64,
    },
    AddAddress {
        token: SessionToken,
        address: Address,
    },
    ChangeAddress {
        token: SessionToken,
        index: usize,
        address: Address,
    },
    DeleteAddress {
        token: SessionToken,
        index: usize,
    },
    GetCredential {
        token: SessionToken,
        kind: CredentialKind,
    },
    ChangeCredential {
        token: SessionToken,
        kind: CredentialKind,
        value: SecretString,
    },
}

/// The answer to an [`ApiCall`].
#[derive(Debug)]
pub enum ApiReply {
    Products(Result<Vec<CatalogEntry>, ApiError>),
    Auth(Result<AuthOutcome, ApiError>),
    LoggedOut(Result<(), ApiError>),
    AddedToCart(Result<(), ApiError>),
    Cart {
        generation: u64,
        result: Result<Vec<CartLine>, ApiError>,
    },
    QuantityUpdated {
        title: String,
        seq: u64,
        result: Result<(), ApiError>,
    },
    CartLineDeleted {
        title: String,
        seq: u64,
        result: Result<(), ApiError>,
    },
    Addresses {
        generation: u64,
        result: Result<Vec<Address>, ApiError>,
    },
    AddressSaved(Result<(), ApiError>),
    AddressDeleted {
        index: usize,
        result: Result<(), ApiError>,
    },
    Credential {
        kind: CredentialKind,
        result: Result<String, ApiError>,
    },
    CredentialChanged(Result<CredentialOutcome, ApiError>),
}

impl ApiCall {
    /// Endpoint-ish name for logs and breadcrumbs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Signup { .. } => "signup",
            Self::Login { .. } => "login",
            Self::Logout { .. } => "logout",
            Self::AddToCart { .. } => "add_to_cart",
            Self::GetCart { .. } => "get_cart",
            Self::UpdateQuantity { .. } => "update_cart_quantity",
            Self::DeleteCartLine { .. } => "delete_cart_line",
            Self::GetAddresses { .. } => "get_addresses",
            Self::AddAddress { .. } => "add_address",
            Self::ChangeAddress { .. } => "change_address",
            Self::DeleteAddress { .. } => "delete_address",
            Self::GetCredential { .. } => "get_credential",
            Self::ChangeCredential { .. } => "change_credential",
        }
    }

    /// Send the request and wrap the result.
    pub async fn execute<A: StorefrontApi>(self, api: &A) -> ApiReply {
        match self {
            Self::Products => ApiReply::Products(api.products().await),
            Self::Signup {
                email,
                username,
                password,
            } => ApiReply::Auth(api.signup(&email, &username, &password).await),
            Self::Login { username, password } => {
                ApiReply::Auth(api.login(&username, &password).await)
            }
            Self::Logout { token } => ApiReply::LoggedOut(api.logout(&token).await),
            Self::AddToCart { token, item } => {
                ApiReply::AddedToCart(api.add_to_cart(&token, &item).await)
            }
            Self::GetCart { token, generation } => ApiReply::Cart {
                generation,
                result: api.cart(&token).await,
            },
            Self::UpdateQuantity {
                token,
                title,
                quantity,
                seq,
            } => {
                let result = api.update_cart_quantity(&token, &title, quantity).await;
                ApiReply::QuantityUpdated { title, seq, result }
            }
            Self::DeleteCartLine { token, title, seq } => {
                let result = api.delete_cart_line(&token, &title).await;
                ApiReply::CartLineDeleted { title, seq, result }
            }
            Self::GetAddresses { token, generation } => ApiReply::Addresses {
                generation,
                result: api.addresses(&token).await,
            },
            Self::AddAddress { token, address } => {
                ApiReply::AddressSaved(api.add_address(&token, &address).await)
            }
            Self::ChangeAddress {
                token,
                index,
                address,
            } => ApiReply::AddressSaved(api.change_address(&token, index, &address).await),
            Self::DeleteAddress { token, index } => ApiReply::AddressDeleted {
                index,
                result: api.delete_address(&token, index).await,
            },
            Self::GetCredential { token, kind } => {
                let result = match kind {
                    CredentialKind::Email => api.email(&token).await,
                    CredentialKind::Username | CredentialKind::Password => {
                        api.username(&token).await
                    }
                };
                ApiReply::Credential { kind, result }
            }
            Self::ChangeCredential { token, kind, value } => {
                ApiReply::CredentialChanged(api.change_credential(&token, kind, &value).await)
            }
        }
    }
}

impl ApiReply {
    /// The error carried by this reply, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Products(Err(e))
            | Self::Auth(Err(e))
            | Self::LoggedOut(Err(e))
            | Self::AddedToCart(Err(e))
            | Self::Cart { result: Err(e), .. }
            | Self::QuantityUpdated { result: Err(e), .. }
            | Self::CartLineDeleted { result: Err(e), .. }
            | Self::Addresses { result: Err(e), .. }
            | Self::AddressSaved(Err(e))
            | Self::AddressDeleted { result: Err(e), .. }
            | Self::Credential { result: Err(e), .. }
            | Self::CredentialChanged(Err(e)) => Some(e),
            _ => None,
        }
    }
}
