//! Request and response bodies as the backend spells them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use capelli_core::{Address, Banner, CartLine, CatalogEntry, CredentialKind, Price, Product};

use super::ApiError;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TokenBody<'a> {
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupBody<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody<'a> {
    pub token: &'a str,
    pub product_title: &'a str,
    pub product_image: &'a str,
    pub product_price: Price,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuantityBody<'a> {
    pub token: &'a str,
    pub product_title: &'a str,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTitleBody<'a> {
    pub token: &'a str,
    pub product_title: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBody<'a> {
    pub token: &'a str,
    pub address_one: &'a str,
    pub address_two: &'a str,
    pub state: &'static str,
    pub zip_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl<'a> AddressBody<'a> {
    pub fn new(token: &'a str, address: &'a Address, index: Option<usize>) -> Self {
        Self {
            token,
            address_one: &address.line1,
            address_two: &address.line2,
            state: address.state.code(),
            zip_code: &address.zip_code,
            index,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexBody<'a> {
    pub token: &'a str,
    pub index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBody<'a> {
    pub token: &'a str,
    pub selected: CredentialKind,
    pub new_credential: &'a str,
}

// =============================================================================
// Responses
// =============================================================================

/// `{"response": "..."}`, used by every endpoint that answers with text.
#[derive(Debug, Deserialize)]
pub struct TextResponse {
    #[serde(default)]
    pub response: Value,
}

impl TextResponse {
    /// The response as text; non-string values are rendered as JSON.
    pub fn into_text(self) -> String {
        match self.response {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct CartResponse {
    pub cart: Listing,
}

#[derive(Debug, Deserialize)]
pub struct AddressesResponse {
    pub addresses: Listing,
}

/// A list of records, or a bare sentinel string in place of the list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing {
    Records(Vec<String>),
    Sentinel(String),
}

/// Sentinel for an empty cart.
pub const NO_CART: &str = "No Cart";

/// Sentinel for an empty address book.
pub const NO_ADDRESSES: &str = "No Addresses";

impl Listing {
    /// The real records, with empty-list sentinels mapped to no records.
    ///
    /// The cart endpoint answers `["No Cart"]` (or `[""]`) when empty; the
    /// address endpoint answers the bare string `"No Addresses"`.
    fn records(self, sentinel: &str) -> Result<Vec<String>, ApiError> {
        match self {
            Self::Records(records) => {
                if let [only] = records.as_slice()
                    && (only.is_empty() || only == sentinel)
                {
                    return Ok(Vec::new());
                }
                Ok(records)
            }
            Self::Sentinel(s) if s.is_empty() || s == sentinel => Ok(Vec::new()),
            Self::Sentinel(s) => Err(ApiError::Rejected(s)),
        }
    }
}

impl CartResponse {
    pub fn into_lines(self) -> Result<Vec<CartLine>, ApiError> {
        self.cart
            .records(NO_CART)?
            .iter()
            .map(|record| CartLine::parse_record(record).map_err(ApiError::from))
            .collect()
    }
}

impl AddressesResponse {
    pub fn into_addresses(self) -> Result<Vec<Address>, ApiError> {
        self.addresses
            .records(NO_ADDRESSES)?
            .iter()
            .map(|record| Address::parse_record(record).map_err(ApiError::from))
            .collect()
    }
}

impl ProductsResponse {
    /// Convert `[type, title, image, category, price]` rows, skipping rows
    /// that cannot be understood.
    pub fn into_entries(self) -> Vec<CatalogEntry> {
        self.products
            .iter()
            .enumerate()
            .filter_map(|(row, fields)| match parse_catalog_row(fields) {
                Ok(entry) => Some(entry),
                Err(reason) => {
                    warn!(row, reason = %reason, "Skipping malformed product row");
                    None
                }
            })
            .collect()
    }
}

fn parse_catalog_row(fields: &[Value]) -> Result<CatalogEntry, String> {
    let text = |i: usize| -> Option<String> {
        match fields.get(i)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };

    let kind = text(0).ok_or("missing type")?;
    let title = text(1).filter(|t| !t.is_empty()).ok_or("missing title")?;
    let image = text(2).unwrap_or_default();

    if kind.eq_ignore_ascii_case("banner") {
        return Ok(CatalogEntry::Banner(Banner { title, image }));
    }
    if !kind.eq_ignore_ascii_case("product") {
        return Err(format!("unknown row type `{kind}`"));
    }

    let category = text(3).ok_or("missing category")?;
    let price = text(4)
        .ok_or("missing price")?
        .parse::<Price>()
        .map_err(|e| e.to_string())?;

    Ok(CatalogEntry::Product(Product {
        title,
        image,
        category,
        price,
    }))
}
