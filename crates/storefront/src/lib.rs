//! Graphica Storefront library.
//!
//! The public JSON API for the print shop: catalog, homepage, session cart,
//! customer accounts, checkout and the payment webhook. Exposed as a library
//! so the router can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
