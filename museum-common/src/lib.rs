//! # Museum Guide Common Library
//!
//! Shared code for the campus museum guide crates:
//! - Building catalog data model and invariants
//! - TOML configuration loading and config file resolution
//! - Common error types

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{Building, Era, Location};
