//! Capelli Core - Shared domain types.
//!
//! This crate provides the types used by the Capelli storefront client:
//! - `capelli-storefront` - headless client, runtime and terminal front-end
//! - `capelli-integration-tests` - fake backend and end-to-end scenarios
//!
//! # Architecture
//!
//! The core crate contains only types and parsing - no I/O, no HTTP clients,
//! no storage. The backend ships cart lines and addresses as `~`-delimited
//! records; parsing those into typed values lives here so every consumer
//! rejects malformed data the same way.
//!
//! # Modules
//!
//! - [`types`] - Prices, quantities, cart lines, addresses, catalog entries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
