//! Core types for Capelli.
//!
//! This module provides type-safe wrappers for the storefront's domain
//! concepts and the record format the backend uses to ship them.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod credential;
pub mod price;
pub mod quantity;
pub mod record;

pub use address::{Address, StateCodeError, UsState};
pub use cart::{CartLine, cart_subtotal};
pub use catalog::{Banner, CatalogEntry, Product};
pub use credential::CredentialKind;
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
pub use record::{DELIMITER, RecordError};
