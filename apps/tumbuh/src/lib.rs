//! # tumbuh
//!
//! Library half of the Tumbuh binary: HTTP API, CLI commands and
//! configuration, exposed so integration tests can drive them directly.

pub mod api;
pub mod cli;
pub mod config;
