//! Graphica Admin library.
//!
//! Back-office catalog management as a library, so the binary, the CLI
//! and the tests share one implementation.
//!
//! # Security
//!
//! Every route is guarded by the shared administrator token. Bind to a
//! private interface; the token is the only gate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
