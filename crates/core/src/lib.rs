//! Varmina Core - Shared types library.
//!
//! This crate provides common types used across all Varmina components:
//! - `storefront` - Catalog, cart, and session orchestration
//! - `admin` - Back-office view controller, forms, and pricing tools
//! - `cli` - Command-line tools for seeding and storage maintenance
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Every
//! record here is a value fetched from (or sent to) the managed backend;
//! mutation goes through the service contracts in `varmina-storefront`.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, products, brand settings, and toasts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
