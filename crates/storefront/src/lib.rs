//! Capelli storefront client library.
//!
//! A headless client for the Capelli hair-tool shop. The [`api`] module talks
//! to the backend, [`screens`] hold each screen's state machine, and
//! [`app::App`] drives them over a [`navigation`] stack. The `capelli`
//! binary puts a terminal front-end on top.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod app;
pub mod cart;
pub mod config;
pub mod error;
pub mod navigation;
pub mod render;
pub mod screens;
pub mod session;
pub mod shell;
